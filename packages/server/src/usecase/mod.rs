//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod authenticate;
pub mod broadcast;
pub mod change_username;
pub mod error;
pub mod login;
pub mod register_user;
pub mod send_chat;

pub use authenticate::{AuthOutcome, AuthenticateUseCase};
pub use broadcast::{BroadcastReport, BroadcastUseCase};
pub use change_username::ChangeUsernameUseCase;
pub use error::{
    AuthenticateError, BroadcastError, ChangeUsernameError, LoginError, RegisterUserError,
    SendChatError,
};
pub use login::LoginUseCase;
pub use register_user::{RegisterUserCommand, RegisterUserUseCase};
pub use send_chat::SendChatUseCase;
