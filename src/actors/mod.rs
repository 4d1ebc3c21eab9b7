// Actor模块 - 使用Actor模式给异步任务提供状态写入口
//
// 传输层等运行在独立任务上的组件通过消息传递更新状态，而不是直接共享 store

pub mod connection_status;

pub use connection_status::{
    ConnectionStatusActor, ConnectionStatusCommand, ConnectionStatusHandle,
};
