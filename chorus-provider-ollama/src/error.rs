//! Internal helpers for mapping HTTP/reqwest errors to [`ChatError`].

use chorus_types::ChatError;

/// Map a non-2xx response from the Ollama API to a [`ChatError`].
pub(crate) fn map_http_status(status: reqwest::StatusCode, body: &str) -> ChatError {
    ChatError::Http {
        status: status.as_u16(),
        body: body.trim().to_string(),
    }
}

/// Map a [`reqwest::Error`] to a [`ChatError`].
///
/// Everything reqwest reports is a transport-level failure from our point of
/// view: refused connections, resets mid-body and DNS errors alike.
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ChatError {
    ChatError::Connection(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_404_keeps_code_and_body() {
        let err = map_http_status(reqwest::StatusCode::NOT_FOUND, "model 'foo' not found");
        assert!(
            matches!(err, ChatError::Http { status: 404, ref body } if body == "model 'foo' not found")
        );
    }

    #[test]
    fn status_500_keeps_code() {
        let err = map_http_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "internal error");
        match err {
            ChatError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal error");
            }
            other => panic!("expected Http, got: {other:?}"),
        }
    }

    #[test]
    fn body_whitespace_is_trimmed() {
        let err = map_http_status(reqwest::StatusCode::BAD_REQUEST, "bad body\n");
        assert!(matches!(err, ChatError::Http { ref body, .. } if body == "bad body"));
    }

    #[test]
    fn empty_body_preserved_in_error() {
        let err = map_http_status(reqwest::StatusCode::BAD_GATEWAY, "");
        assert!(matches!(err, ChatError::Http { status: 502, ref body } if body.is_empty()));
    }
}
