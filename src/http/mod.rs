//! Request/response model, body encoders and authentication.

pub mod digestauth;
pub mod formdata;
pub mod headerbuilder;
pub mod httpauth;
pub mod mimesniff;
pub mod multipart;
pub mod orderedheaders;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod responsebody;

// Re-exports for convenience
pub use formdata::{ParamValue, Params, Scalar};
pub use httpauth::{AuthCredential, AuthScheme};
pub use request::{FileUpload, HttpRequest};
pub use requestbody::RequestBody;
pub use response::HttpResponse;
pub use responsebody::ResponseBody;
