//! The client call surface: typed entry points that turn calls into
//! profile request events on the host bus.

use profile_store::{map_from_json, map_to_json, AttributeMap};

use crate::constants;
use crate::event::Event;
use crate::runtime::{ExtensionRuntime, Responder};

/// Errors surfaced through the get callback. Core logic failures never
/// appear here; they degrade to an empty or partial result instead.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The host could not deliver the response within its own timeout.
    #[error("the host did not deliver a response in time")]
    Timeout,

    /// A delivered response whose payload does not decode.
    #[error("unexpected response payload: {0}")]
    UnexpectedResponse(String),
}

/// Client handle over an injected runtime.
pub struct ProfileClient<R> {
    runtime: R,
}

impl<R: ExtensionRuntime> ProfileClient<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// Requests a batch update of profile attributes. Fire-and-forget;
    /// a rejected batch is visible only through the absence of a new
    /// shared state.
    pub fn update_user_attributes(&self, attributes: &AttributeMap) {
        let data = serde_json::json!({ constants::UPDATE_DATA_KEY: map_to_json(attributes) });
        self.runtime.dispatch(Event::new(
            "UpdateUserAttributes",
            constants::EVENT_TYPE_PROFILE,
            constants::SOURCE_REQUEST_PROFILE,
            Some(data),
        ));
    }

    /// Requests removal of the named attributes.
    pub fn remove_user_attributes(&self, keys: &[String]) {
        let data = serde_json::json!({ constants::REMOVE_DATA_KEY: keys });
        self.runtime.dispatch(Event::new(
            "RemoveUserAttributes",
            constants::EVENT_TYPE_PROFILE,
            constants::SOURCE_REQUEST_RESET,
            Some(data),
        ));
    }

    /// Requests a full reset of the profile.
    pub fn reset_user_attributes(&self) {
        self.runtime.dispatch(Event::new(
            "ResetUserAttributes",
            constants::EVENT_TYPE_PROFILE,
            constants::SOURCE_REQUEST_RESET,
            None,
        ));
    }

    /// Requests the named attributes (all of them for an empty list)
    /// and hands the decoded result to `callback`.
    pub fn get_user_attributes(
        &self,
        keys: &[String],
        callback: impl FnOnce(Result<AttributeMap, ClientError>) + Send + 'static,
    ) {
        let data = serde_json::json!({ constants::GET_DATA_KEY: keys });
        let event = Event::new(
            "getUserAttributes",
            constants::EVENT_TYPE_PROFILE,
            constants::SOURCE_REQUEST_PROFILE,
            Some(data),
        );
        let responder: Responder = Box::new(move |response| {
            let result = match response {
                None => Err(ClientError::Timeout),
                Some(event) => decode_response(&event),
            };
            callback(result);
        });
        self.runtime.dispatch_with_responder(event, responder);
    }
}

fn decode_response(event: &Event) -> Result<AttributeMap, ClientError> {
    let payload = event
        .data
        .as_ref()
        .and_then(|data| data.get(constants::GET_DATA_KEY))
        .ok_or_else(|| {
            ClientError::UnexpectedResponse("response carries no attribute payload".to_string())
        })?;
    map_from_json(payload).map_err(|err| ClientError::UnexpectedResponse(err.to_string()))
}
