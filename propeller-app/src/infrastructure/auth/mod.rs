mod google_oauth;

pub use google_oauth::{AuthorizationRequest, GoogleOAuth, GoogleUserInfo};
