//! Message envelope codec.
//!
//! Every protocol exchange is one JSON object per line:
//!
//! ```text
//! {"src": "c1", "dest": "n1", "body": {"type": "echo", "msg_id": 2, "echo": "hello"}}
//! ```
//!
//! The body carries a `type` discriminator, the optional `msg_id` and
//! `in_reply_to` correlation fields, and any number of type-specific payload
//! fields. Payload fields are kept as an opaque JSON object so that fields no
//! handler knows about survive a decode/encode cycle unchanged, numbers
//! outside the 64-bit range included.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{DecodeError, HandlerError};

/// Sender-scoped message identifier.
pub type MsgId = u64;

/// Initial capacity for an encoded frame
const ENCODE_CAPACITY: usize = 256;

const TYPE_FIELD: &str = "type";
const MSG_ID_FIELD: &str = "msg_id";
const IN_REPLY_TO_FIELD: &str = "in_reply_to";

/// A single protocol message: request or reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "src")]
    pub source: String,
    #[serde(rename = "dest")]
    pub destination: String,
    pub body: Body,
}

/// Typed payload of a message, discriminated by `type`.
///
/// Serialized as one flat JSON object: `type`, `msg_id` and `in_reply_to`
/// first, then the payload fields. The codec is written by hand because
/// `#[serde(flatten)]` cannot decode numbers once `arbitrary_precision` is on.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub kind: String,
    pub msg_id: Option<MsgId>,
    pub in_reply_to: Option<MsgId>,
    /// Type-specific fields, preserved verbatim.
    pub payload: Map<String, Value>,
}

impl Message {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, body: Body) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            body,
        }
    }

    /// Build a reply to this message sent from `source`.
    ///
    /// The reply is addressed to this message's sender and correlated through
    /// `in_reply_to`. Its `msg_id` is left unset; the dispatcher assigns it.
    pub fn reply(&self, source: impl Into<String>, mut body: Body) -> Message {
        body.msg_id = None;
        body.in_reply_to = self.body.msg_id;
        Message {
            source: source.into(),
            destination: self.source.clone(),
            body,
        }
    }
}

impl Body {
    /// Create a body of the given type with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            msg_id: None,
            in_reply_to: None,
            payload: Map::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(field.into(), value.into());
        self
    }

    /// Look up a single payload field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.payload.get(field)
    }

    /// Deserialize the payload fields into a typed structure.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|source| {
            HandlerError::MalformedBody {
                kind: self.kind.clone(),
                source,
            }
        })
    }

    /// Whether this body answers an earlier request rather than asking for work.
    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some() || self.kind.ends_with("_ok") || self.kind == "error"
    }
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(TYPE_FIELD, &self.kind)?;
        if let Some(msg_id) = self.msg_id {
            map.serialize_entry(MSG_ID_FIELD, &msg_id)?;
        }
        if let Some(in_reply_to) = self.in_reply_to {
            map.serialize_entry(IN_REPLY_TO_FIELD, &in_reply_to)?;
        }
        for (field, value) in &self.payload {
            // Header fields are owned by the struct, never by the payload
            if !is_header_field(field) {
                map.serialize_entry(field, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Body {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut payload = Map::<String, Value>::deserialize(deserializer)?;

        let kind = match payload.remove(TYPE_FIELD) {
            Some(Value::String(kind)) => kind,
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "invalid type: expected a string, found {}",
                    other
                )))
            }
            None => return Err(de::Error::missing_field(TYPE_FIELD)),
        };
        let msg_id = take_id(&mut payload, MSG_ID_FIELD)?;
        let in_reply_to = take_id(&mut payload, IN_REPLY_TO_FIELD)?;

        Ok(Body {
            kind,
            msg_id,
            in_reply_to,
            payload,
        })
    }
}

fn is_header_field(field: &str) -> bool {
    field == TYPE_FIELD || field == MSG_ID_FIELD || field == IN_REPLY_TO_FIELD
}

/// Remove an optional message id field; `null` counts as absent.
fn take_id<E: de::Error>(
    payload: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<MsgId>, E> {
    match payload.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            E::custom(format!(
                "invalid {}: expected an unsigned integer, found {}",
                field, value
            ))
        }),
    }
}

/// Decode one line of input into a message.
///
/// A trailing line terminator is ignored. Empty lines and anything that is
/// not a complete message envelope are rejected.
pub fn decode(line: &str) -> Result<Message, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    serde_json::from_str(line).map_err(DecodeError::Json)
}

/// Decode one raw line of input.
pub fn decode_bytes(line: &[u8]) -> Result<Message, DecodeError> {
    let line = std::str::from_utf8(line).map_err(DecodeError::InvalidUtf8)?;
    decode(line)
}

/// Encode a message as a single newline-terminated frame.
///
/// JSON string escaping guarantees the only raw newline in the frame is the
/// terminator.
pub fn encode(message: &Message) -> Result<Bytes, serde_json::Error> {
    let mut writer = BytesMut::with_capacity(ENCODE_CAPACITY).writer();
    serde_json::to_writer(&mut writer, message)?;
    let mut frame = writer.into_inner();
    frame.put_u8(b'\n');
    Ok(frame.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    const INIT: &str = r#"{"src":"c1","dest":"n1","body":{"type":"init","msg_id":1,"node_id":"n1","node_ids":["n1","n2"]}}"#;

    #[test]
    fn test_decode_init() {
        let msg = decode(INIT).unwrap();
        assert_eq!(msg.source, "c1");
        assert_eq!(msg.destination, "n1");
        assert_eq!(msg.body.kind, "init");
        assert_eq!(msg.body.msg_id, Some(1));
        assert_eq!(msg.body.in_reply_to, None);
        assert_eq!(msg.body.get("node_id"), Some(&json!("n1")));
        assert_eq!(msg.body.get("node_ids"), Some(&json!(["n1", "n2"])));
    }

    #[test]
    fn test_decode_strips_line_ending() {
        let line = format!("{}\r\n", INIT);
        assert_eq!(decode(&line).unwrap(), decode(INIT).unwrap());
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(decode(""), Err(DecodeError::Empty)));
        assert!(matches!(decode("  \r\n"), Err(DecodeError::Empty)));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode("[1, 2, 3]"), Err(DecodeError::Json(_))));
        // Missing body type
        assert!(matches!(
            decode(r#"{"src":"c1","dest":"n1","body":{"msg_id":1}}"#),
            Err(DecodeError::Json(_))
        ));
        // Missing envelope fields
        assert!(matches!(
            decode(r#"{"body":{"type":"echo"}}"#),
            Err(DecodeError::Json(_))
        ));
        // Trailing garbage after the object
        assert!(matches!(
            decode(&format!("{} {}", INIT, INIT)),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_decode_bytes_invalid_utf8() {
        assert!(matches!(
            decode_bytes(b"{\"src\":\"\xff\"}"),
            Err(DecodeError::InvalidUtf8(_))
        ));
        assert!(decode_bytes(INIT.as_bytes()).is_ok());
    }

    #[test]
    fn test_round_trip_preserves_extra_fields() {
        let line = r#"{"src":"c1","dest":"n1","body":{"type":"echo","msg_id":7,"echo":{"nested":[1,2]},"trace":"abc"}}"#;
        let msg = decode(line).unwrap();
        let encoded = encode(&msg).unwrap();

        let expected: Value = serde_json::from_str(line).unwrap();
        let reencoded: Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(expected, reencoded);
        assert_eq!(decode_bytes(&encoded).unwrap(), msg);
    }

    #[test]
    fn test_round_trip_preserves_large_numbers() {
        let line = r#"{"src":"c1","dest":"n1","body":{"type":"echo","msg_id":18446744073709551615,"echo":123456789012345678901234567890,"exact":0.1000000000000000055511151231257827,"low":-9223372036854775809}}"#;
        let msg = decode(line).unwrap();
        assert_eq!(msg.body.msg_id, Some(u64::MAX));

        let encoded = encode(&msg).unwrap();
        assert_eq!(&encoded[..encoded.len() - 1], line.as_bytes());
    }

    #[test]
    fn test_decode_rejects_bad_ids() {
        for body in [
            r#"{"type":"echo","msg_id":-1}"#,
            r#"{"type":"echo","msg_id":"7"}"#,
            r#"{"type":"echo","msg_id":1.5}"#,
            r#"{"type":"echo","in_reply_to":123456789012345678901234567890}"#,
            r#"{"type":7}"#,
        ] {
            let line = format!(r#"{{"src":"c1","dest":"n1","body":{}}}"#, body);
            assert!(
                matches!(decode(&line), Err(DecodeError::Json(_))),
                "accepted {}",
                body
            );
        }

        let msg = decode(r#"{"src":"c1","dest":"n1","body":{"type":"echo","msg_id":null}}"#).unwrap();
        assert_eq!(msg.body.msg_id, None);
    }

    #[test]
    fn test_encode_header_fields_win() {
        let mut body = Body::new("echo_ok").with("type", "spoofed").with("msg_id", 99);
        body.msg_id = Some(3);
        let encoded = encode(&Message::new("n1", "c1", body)).unwrap();
        assert_eq!(
            &encoded[..],
            b"{\"src\":\"n1\",\"dest\":\"c1\",\"body\":{\"type\":\"echo_ok\",\"msg_id\":3}}\n"
        );
    }

    #[test]
    fn test_encode_omits_absent_ids() {
        let msg = Message::new("n1", "c1", Body::new("init_ok"));
        let encoded = encode(&msg).unwrap();
        assert_eq!(
            &encoded[..],
            b"{\"src\":\"n1\",\"dest\":\"c1\",\"body\":{\"type\":\"init_ok\"}}\n"
        );
    }

    #[test]
    fn test_encode_single_line() {
        let msg = Message::new("n1", "c1", Body::new("echo_ok").with("echo", "a\nb\r\nc"));
        let encoded = encode(&msg).unwrap();
        assert_eq!(encoded.iter().filter(|&&b| b == b'\n').count(), 1);
        assert_eq!(encoded.last(), Some(&b'\n'));
    }

    #[test]
    fn test_reply_addressing() {
        let request = decode(INIT).unwrap();
        let reply = request.reply("n1", Body::new("init_ok"));
        assert_eq!(reply.source, "n1");
        assert_eq!(reply.destination, "c1");
        assert_eq!(reply.body.in_reply_to, Some(1));
        assert_eq!(reply.body.msg_id, None);
    }

    #[test]
    fn test_typed_payload() {
        #[derive(Deserialize)]
        struct Init {
            node_id: String,
            node_ids: Vec<String>,
        }

        let msg = decode(INIT).unwrap();
        let init: Init = msg.body.payload().unwrap();
        assert_eq!(init.node_id, "n1");
        assert_eq!(init.node_ids, vec!["n1", "n2"]);

        let bad = Body::new("init").with("node_id", 5);
        assert!(matches!(
            bad.payload::<Init>(),
            Err(HandlerError::MalformedBody { .. })
        ));
    }

    #[test]
    fn test_is_reply() {
        assert!(Body::new("echo_ok").is_reply());
        assert!(Body::new("error").is_reply());
        assert!(!Body::new("echo").is_reply());

        let mut body = Body::new("read");
        body.in_reply_to = Some(3);
        assert!(body.is_reply());
    }
}
