pub mod google_api_client;
pub mod native_login;
pub mod service_account;
pub mod web_popup;

pub use google_api_client::GoogleApiClient;
pub use native_login::{NativeLoginOptions, NativeTokenProvider, RefreshTokenLogin};
pub use service_account::ServiceAccountTokenProvider;
pub use web_popup::WebPopupTokenProvider;

/// The only Drive scope requested: access to files this app creates or opens.
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
