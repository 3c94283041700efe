use crate::{
    common::error::{Error, RequestParse, Result},
    config::DeployConfig,
    deploy::{self, DeployRequest},
};
use actix_web::{
    http::{header::ContentType, StatusCode},
    post, web, HttpResponse, ResponseError,
};
use serde::Serialize;
use snafu::ResultExt;
use tracing::error;

/// Response body shared by success and recognized-failure cases. `result` carries
/// the captured command output, or the error message for `status: "error"`.
#[derive(Debug, Serialize)]
pub(crate) struct DeployResponse {
    status: &'static str,
    result: Option<String>,
}

impl DeployResponse {
    fn ok(result: Option<String>) -> Self {
        Self {
            status: "ok",
            result,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error",
            result: Some(message),
        }
    }
}

/// Unrecognized failures fall through actix as plain internal faults, they are not
/// translated into the `{status, result}` shape.
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Deploy endpoint. Success and every recognized request-level failure answer with
/// HTTP 200, the logical outcome sits in the JSON body.
#[post("/")]
pub(crate) async fn apply_release(
    config: web::Data<DeployConfig>,
    body: web::Bytes,
) -> Result<HttpResponse, Error> {
    let response = match handle(config.get_ref(), body.as_ref()).await {
        Ok(result) => DeployResponse::ok(result),
        Err(err) if err.is_reportable() => {
            error!(%err, "Deploy request failed");
            DeployResponse::error(err.to_string())
        }
        Err(err) => return Err(err),
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .json(response))
}

async fn handle(config: &DeployConfig, body: &[u8]) -> Result<Option<String>> {
    let request: DeployRequest = serde_json::from_slice(body).context(RequestParse)?;
    deploy::deploy(config, &request).await
}
