//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層と Infrastructure 層を操作します。

pub mod connect_session;
pub mod delete_user;
pub mod disconnect_session;
pub mod error;
pub mod group_history;
pub mod join_group;
pub mod leave_group;
pub mod login;
pub mod relay;
pub mod seed_membership;
pub mod send_message;
pub mod signup;
pub mod update_user;

pub use connect_session::{ConnectSessionUseCase, ConnectedSession};
pub use delete_user::DeleteUserUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{AuthError, RelayError};
pub use group_history::GroupHistoryUseCase;
pub use join_group::JoinGroupUseCase;
pub use leave_group::LeaveGroupUseCase;
pub use login::LoginUseCase;
pub use relay::{ClientCommand, RelayServices, SessionRelay, SessionState};
pub use seed_membership::{SeedMembershipUseCase, SeedReport};
pub use send_message::{SendMessageCommand, SendMessageUseCase, SendOutcome};
pub use signup::{AuthOutcome, SignupInput, SignupUseCase};
pub use update_user::{UpdateUserUseCase, UserUpdate};
