//! 成员数据导入
//!
//! 把维基表格行和官网成员行（以表头为键的字符串映射）合并、清洗成 Member 列表：
//! - 表头映射为英文字段
//! - 出生信息拆分为出生地和日期
//! - 社交媒体按行解析，平台缩写统一
//! - 每条记录生成新的 UUID

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::models::Member;

/// 原始表格行（表头 -> 单元格文本）
pub type RawRow = BTreeMap<String, String>;

/// 官网头像的站点根地址
const SITE_BASE_URL: &str = "https://jkt48.com";

const KEY_NAME: &str = "Nama";
const KEY_PICTURE: &str = "Link Gambar Profil";
const KEY_FULL_NAME: &str = "Nama lengkap";
const KEY_NICKNAME: &str = "Nama panggilan";
const KEY_BIRTH: &str = "Kelahiran (usia)";
const KEY_SOCIAL_MEDIA: &str = "Akun media sosial";

/// 忽略的单元格值
fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "N/A"
}

/// 把相对地址补全为官网绝对地址
pub fn absolute_picture_url(src: &str) -> String {
    if src.starts_with("http") {
        src.to_string()
    } else {
        format!("{}{}", SITE_BASE_URL, src)
    }
}

/// 拆分出生信息，返回 (出生地, 出生日期)
///
/// 例: "Jakarta,Indonesia, 26 Agustus 2006 (18 tahun)[23]" -> ("Jakarta,Indonesia", "26 Agustus 2006")
/// 没有逗号时整体作为出生日期，出生地为空
pub fn parse_birth(value: &str) -> (String, String) {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    static AGE: OnceLock<Regex> = OnceLock::new();
    static ISO_DATE: OnceLock<Regex> = OnceLock::new();

    let reference = REFERENCE.get_or_init(|| Regex::new(r"\[\d+\]").unwrap());
    let age = AGE.get_or_init(|| Regex::new(r"\s*\([^)]*tahun[^)]*\)\s*$").unwrap());
    let iso_date = ISO_DATE.get_or_init(|| Regex::new(r"^\s*\(\d{4}-\d{2}-\d{2}\)").unwrap());

    let cleaned = reference.replace_all(value, "");
    let cleaned = cleaned.trim();
    let cleaned = age.replace(cleaned, "");
    let cleaned = cleaned.trim();

    match cleaned.rfind(',') {
        Some(index) => {
            let place = cleaned[..index].trim().to_string();
            let date = iso_date.replace(cleaned[index + 1..].trim(), "").trim().to_string();
            (place, date)
        }
        None => {
            debug!("出生信息格式无法识别，整体保留: {}", value);
            (String::new(), cleaned.to_string())
        }
    }
}

/// 解析社交媒体账号，每行一个 "平台: 账号"
pub fn parse_social_media(value: &str) -> BTreeMap<String, String> {
    value
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, handle)| {
            let key = key.trim().to_uppercase();
            let key = match key.as_str() {
                "@" => "THREADS".to_string(),
                "IDN" => "IDN_LIVE".to_string(),
                "IG" => "INSTAGRAM".to_string(),
                "SR" => "SHOWROOM".to_string(),
                "TT" => "TIKTOK".to_string(),
                _ => key,
            };
            (key, handle.trim().to_string())
        })
        .collect()
}

/// 拆分昵称列表
pub fn parse_nicknames(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|nick| !nick.is_empty())
        .map(str::to_string)
        .collect()
}

fn empty_member() -> Member {
    Member {
        id: uuid::Uuid::new_v4().to_string(),
        name: String::new(),
        full_name: String::new(),
        nickname: Vec::new(),
        birth_place: String::new(),
        birth_date: String::new(),
        generation: String::new(),
        introduction_phrase: String::new(),
        profile_picture_url: String::new(),
        join_details_jkt48: None,
        promoted_details_jkt48: None,
        previous_formation: None,
        sub_unit: None,
        fanbase_name: None,
        reference: None,
        social_media: None,
    }
}

/// 把一行原始数据清洗成 Member；没有任何可用字段时返回 None
///
/// id 不算可用字段：全空或全 N/A 的行直接丢弃，不会生成只有 id 的空记录。
pub fn normalize_row(row: &RawRow) -> Option<Member> {
    let mut member = empty_member();
    let mut used = false;

    for (key, value) in row {
        if is_blank(value) {
            continue;
        }

        let value = value.clone();
        match key.as_str() {
            KEY_NAME => member.name = value,
            KEY_PICTURE => member.profile_picture_url = absolute_picture_url(&value),
            KEY_FULL_NAME => member.full_name = value,
            KEY_NICKNAME => member.nickname = parse_nicknames(&value),
            KEY_BIRTH => {
                let (place, date) = parse_birth(&value);
                member.birth_place = place;
                member.birth_date = date;
            }
            KEY_SOCIAL_MEDIA => {
                let social_media = parse_social_media(&value);
                if social_media.is_empty() {
                    continue;
                }
                member.social_media = Some(social_media);
            }
            "Generasi" => member.generation = value,
            "Salam perkenalan" => member.introduction_phrase = value,
            "Mulai dan durasi bergabung (di JKT48)" => member.join_details_jkt48 = Some(value),
            "Formasi sebelumnya (tanggal pembubaran atau terakhir bergabung)" => {
                member.previous_formation = Some(value)
            }
            "Mulai dan durasi bergabung (sebagai anggota tetap JKT48)" => {
                member.promoted_details_jkt48 = Some(value)
            }
            "Sub-unit" => member.sub_unit = Some(value),
            "Nama fanbase" => member.fanbase_name = Some(value),
            "Ref." => member.reference = Some(value),
            _ => continue,
        }
        used = true;
    }

    used.then_some(member)
}

fn words(value: &str) -> HashSet<String> {
    value.split_whitespace().map(str::to_string).collect()
}

/// 合并维基数据和官网数据
///
/// 先按"官网名字的每个词都出现在全名里"匹配，再按昵称匹配；
/// 匹配上的记录以维基行为底、官网行覆盖。
/// 未匹配的维基行原样保留，未匹配的官网行按名字排序追加到末尾。
pub fn merge_rows(wiki_rows: &[RawRow], site_rows: &[RawRow]) -> Vec<RawRow> {
    // 名字（小写） -> 官网行，重名时以后出现的为准
    let mut lookup: BTreeMap<String, &RawRow> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in site_rows {
        let name = row.get(KEY_NAME).map(|n| n.to_lowercase()).unwrap_or_default();
        if lookup.insert(name.clone(), row).is_none() {
            order.push(name);
        }
    }

    let mut unmatched: Vec<String> = order;
    let mut combined = Vec::with_capacity(wiki_rows.len() + unmatched.len());
    let mut matches_found = 0;

    for wiki_row in wiki_rows {
        let full_name = words(
            &wiki_row
                .get(KEY_FULL_NAME)
                .map(|n| n.to_lowercase())
                .unwrap_or_default(),
        );
        let nicknames: Vec<String> = wiki_row
            .get(KEY_NICKNAME)
            .map(|n| n.split(',').map(|nick| nick.trim().to_lowercase()).collect())
            .unwrap_or_default();

        let by_full_name = unmatched.iter().position(|name| {
            let name_words = words(name);
            !name_words.is_empty() && name_words.is_subset(&full_name)
        });
        let matched = by_full_name.or_else(|| unmatched.iter().position(|name| nicknames.contains(name)));

        match matched {
            Some(index) => {
                let name = unmatched.remove(index);
                let mut merged = wiki_row.clone();
                if let Some(site_row) = lookup.get(&name) {
                    merged.extend(site_row.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                combined.push(merged);
                matches_found += 1;
            }
            None => combined.push(wiki_row.clone()),
        }
    }

    if !unmatched.is_empty() {
        warn!("{} 位官网成员无法与维基数据匹配", unmatched.len());
        let remaining: BTreeSet<String> = unmatched.into_iter().collect();
        for name in remaining {
            debug!(" - {}", name);
            if let Some(site_row) = lookup.get(&name) {
                combined.push((*site_row).clone());
            }
        }
    }

    info!("合并完成，{} 条数据匹配成功", matches_found);
    combined
}

/// 导入成员：两边都有数据时合并，否则只用有数据的一边
pub fn import_members(wiki_rows: &[RawRow], site_rows: &[RawRow]) -> Vec<Member> {
    let rows = match (wiki_rows.is_empty(), site_rows.is_empty()) {
        (false, false) => merge_rows(wiki_rows, site_rows),
        (false, true) => {
            info!("没有官网数据，只导入维基数据");
            wiki_rows.to_vec()
        }
        (true, false) => {
            info!("没有维基数据，只导入官网数据");
            site_rows.to_vec()
        }
        (true, true) => {
            warn!("两边都没有成员数据");
            Vec::new()
        }
    };

    rows.iter().filter_map(normalize_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_birth_strips_age_and_references() {
        assert_eq!(
            parse_birth("Jakarta,Indonesia, 26 Agustus 2006 (18 tahun)"),
            ("Jakarta,Indonesia".to_string(), "26 Agustus 2006".to_string())
        );
        assert_eq!(
            parse_birth("Sydney,Australia, 23 Desember 2009 (15 tahun)[23]"),
            ("Sydney,Australia".to_string(), "23 Desember 2009".to_string())
        );
    }

    #[test]
    fn test_parse_birth_iso_prefix() {
        assert_eq!(
            parse_birth("Bandung, (2005-03-01) 1 Maret 2005 (19 tahun)"),
            ("Bandung".to_string(), "1 Maret 2005".to_string())
        );
    }

    #[test]
    fn test_parse_birth_without_comma() {
        assert_eq!(
            parse_birth("12 Mei 2007"),
            (String::new(), "12 Mei 2007".to_string())
        );
    }

    #[test]
    fn test_parse_social_media_aliases() {
        let social = parse_social_media("IG: jkt48.aurel\nTT: jkt48.aurel\n@: aurel\nSR: JKT48_Aurel\nIDN: aurel\nx: A_Aurel\ntanpa titik dua");
        assert_eq!(social.get("INSTAGRAM").map(String::as_str), Some("jkt48.aurel"));
        assert_eq!(social.get("TIKTOK").map(String::as_str), Some("jkt48.aurel"));
        assert_eq!(social.get("THREADS").map(String::as_str), Some("aurel"));
        assert_eq!(social.get("SHOWROOM").map(String::as_str), Some("JKT48_Aurel"));
        assert_eq!(social.get("IDN_LIVE").map(String::as_str), Some("aurel"));
        assert_eq!(social.get("X").map(String::as_str), Some("A_Aurel"));
        assert_eq!(social.len(), 6);
    }

    #[test]
    fn test_parse_social_media_keeps_url_colons() {
        let social = parse_social_media("YT: https://youtube.com/@aurel");
        assert_eq!(
            social.get("YT").map(String::as_str),
            Some("https://youtube.com/@aurel")
        );
    }

    #[test]
    fn test_normalize_row() {
        let member = normalize_row(&row(&[
            ("Nama", "Aurelia Putri"),
            ("Link Gambar Profil", "/profile/aurelia.jpg"),
            ("Nama lengkap", "Aurelia Putri Maharani"),
            ("Nama panggilan", "Aurel, Lia, "),
            ("Kelahiran (usia)", "Jakarta, Indonesia, 14 Februari 2004 (20 tahun)"),
            ("Generasi", "9"),
            ("Sub-unit", "N/A"),
            ("Nama fanbase", ""),
            ("Ref.", "[12]"),
            ("Kolom lain", "diabaikan"),
        ]))
        .unwrap();

        assert_eq!(member.name, "Aurelia Putri");
        assert_eq!(member.profile_picture_url, "https://jkt48.com/profile/aurelia.jpg");
        assert_eq!(member.nickname, vec!["Aurel", "Lia"]);
        assert_eq!(member.birth_place, "Jakarta, Indonesia");
        assert_eq!(member.birth_date, "14 Februari 2004");
        assert_eq!(member.generation, "9");
        assert_eq!(member.sub_unit, None);
        assert_eq!(member.fanbase_name, None);
        assert_eq!(member.reference.as_deref(), Some("[12]"));
        assert!(uuid::Uuid::parse_str(&member.id).is_ok());
    }

    #[test]
    fn test_normalize_row_without_usable_fields() {
        assert!(normalize_row(&row(&[("Nama", "N/A"), ("Kolom lain", "x")])).is_none());
    }

    #[test]
    fn test_merge_by_full_name_then_nickname() {
        let wiki = vec![
            row(&[("Nama lengkap", "Aurelia Putri Maharani"), ("Nama panggilan", "Aurel")]),
            row(&[("Nama lengkap", "Kirana Dewi Anjani"), ("Nama panggilan", "Kira, Nana")]),
            row(&[("Nama lengkap", "Tanpa Pasangan"), ("Generasi", "3")]),
        ];
        let site = vec![
            row(&[("Nama", "Aurelia Putri"), ("Link Gambar Profil", "https://jkt48.com/a.jpg")]),
            row(&[("Nama", "Nana"), ("Link Gambar Profil", "/k.jpg")]),
            row(&[("Nama", "Zahra"), ("Link Gambar Profil", "/z.jpg")]),
            row(&[("Nama", "Bella"), ("Link Gambar Profil", "/b.jpg")]),
        ];

        let merged = merge_rows(&wiki, &site);
        assert_eq!(merged.len(), 5);

        assert_eq!(merged[0].get("Nama").map(String::as_str), Some("Aurelia Putri"));
        assert_eq!(merged[1].get("Nama").map(String::as_str), Some("Nana"));
        assert_eq!(merged[1].get("Nama lengkap").map(String::as_str), Some("Kirana Dewi Anjani"));
        assert!(merged[2].get("Nama").is_none());

        // 未匹配的官网数据按名字排序追加
        assert_eq!(merged[3].get("Nama").map(String::as_str), Some("Bella"));
        assert_eq!(merged[4].get("Nama").map(String::as_str), Some("Zahra"));
    }

    #[test]
    fn test_import_members_single_side() {
        let site = vec![row(&[("Nama", "Bella"), ("Link Gambar Profil", "/b.jpg")])];
        let members = import_members(&[], &site);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].profile_picture_url, "https://jkt48.com/b.jpg");

        assert!(import_members(&[], &[]).is_empty());
    }

    #[test]
    fn test_import_ids_are_unique() {
        let wiki = vec![
            row(&[("Nama lengkap", "A Satu")]),
            row(&[("Nama lengkap", "B Dua")]),
        ];
        let members = import_members(&wiki, &[]);
        assert_eq!(members.len(), 2);
        assert_ne!(members[0].id, members[1].id);
    }
}
