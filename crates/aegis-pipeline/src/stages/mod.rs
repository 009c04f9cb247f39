//! Pipeline stage implementations.
//!
//! Stage order is owned by the pipeline builder; each module here only
//! implements one stage's behavior. The docker redirect stage is the
//! single conditionally-present stage.

pub mod authentication;
pub mod authorization;
pub mod cookie_policy;
pub mod docker_redirect;
pub mod error_boundary;
pub mod forwarded_headers;
pub mod localization;
pub mod path_base;
pub mod routing;
pub mod security_headers;
pub mod static_files;

pub use authentication::AuthenticationStage;
pub use authorization::AuthorizationStage;
pub use cookie_policy::CookiePolicyStage;
pub use docker_redirect::DockerRedirectStage;
pub use error_boundary::{ErrorBoundaryStage, HstsStage};
pub use forwarded_headers::{ForwardedHeadersOptions, ForwardedHeadersStage};
pub use localization::LocalizationStage;
pub use path_base::PathBaseStage;
pub use routing::RoutingStage;
pub use security_headers::SecurityHeadersStage;
pub use static_files::StaticFilesStage;
