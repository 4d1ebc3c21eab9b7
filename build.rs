fn main() {
    // 只有桌面壳需要根据 tauri.conf.json 生成上下文
    #[cfg(feature = "desktop")]
    tauri_build::build()
}
