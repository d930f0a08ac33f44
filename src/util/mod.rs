pub mod http;
/// 等待一組任務全部完成
pub mod wait_group;
