use async_trait::async_trait;
use gloo_net::http::{Method as HttpMethod, RequestBuilder};
use log::debug;

use unblot::rest::{Method, RestRequest, RestResponse, Transport, TransportError};

/// Sends requests with `fetch`.
pub struct FetchTransport;

fn http_method(method: Method) -> HttpMethod {
    match method {
        Method::Get => HttpMethod::GET,
        Method::Head => HttpMethod::HEAD,
        Method::Post => HttpMethod::POST,
        Method::Patch => HttpMethod::PATCH,
        Method::Put => HttpMethod::PUT,
        Method::Delete => HttpMethod::DELETE,
    }
}

fn failed(error: gloo_net::Error) -> TransportError {
    TransportError(error.to_string())
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: RestRequest) -> Result<RestResponse, TransportError> {
        let RestRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = RequestBuilder::new(&url).method(http_method(method));
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        let prepared = match body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(failed)?;

        let response = prepared.send().await.map_err(failed)?;
        let status = response.status();
        let headers = response.headers().entries().collect();
        let body = response.text().await.map_err(failed)?;
        debug!("{} {} -> {}", method_name(method), url, status);

        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Get => "GET",
        Method::Head => "HEAD",
        Method::Post => "POST",
        Method::Patch => "PATCH",
        Method::Put => "PUT",
        Method::Delete => "DELETE",
    }
}
