use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct ConnectParams {
    /// Access token. Browsers' `EventSource` cannot set headers, so the query
    /// parameter is the primary way to authenticate; `Authorization: Bearer` is the fallback.
    pub(crate) token: Option<String>,
}
