//! Companion-app message classifier.
//!
//! The app writes short JSON documents to the message characteristic:
//!
//! ```text
//! {"type":"notification","app":"...","time":"...","texts":["...", ...]}
//! {"type":"media","title":"...","artist":"...","status":"...","is_playing":true,
//!  "audio_amplitude":{"amplitude":0.5,"peak":0.7,"rms":0.3}}
//! ```
//!
//! Some app builds send the document as a JSON string literal (wrapped in
//! quotes with inner quotes escaped), so one such layer is stripped first.
//!
//! Decoding is two-pass on fixed-capacity buffers: a header pass reads only
//! `type`, then the matching payload struct is decoded from the same text.
//! Unknown fields are skipped and over-long strings are truncated.

use core::fmt;
use core::ops::Deref;

use heapless::{String, Vec};
use serde::de::{self, Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;

use crate::config::MAX_MESSAGE_LEN;
use crate::error::Error;

/// Maximum number of notification lines kept.
pub const MAX_LINES: usize = 5;

/// Capacity of a notification line.
pub const LINE_LEN: usize = 96;

/// Fixed-capacity string that truncates instead of failing when the
/// decoded value is longer than `N` bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Text<const N: usize>(String<N>);

impl<const N: usize> Text<N> {
    pub fn new(text: &str) -> Self {
        let mut out = String::new();
        for c in text.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<const N: usize> Deref for Text<N> {
    type Target = str;

    fn deref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(feature = "defmt")]
impl<const N: usize> defmt::Format for Text<N> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.0.as_str())
    }
}

impl<'de, const N: usize> Deserialize<'de> for Text<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TextVisitor<const N: usize>;

        impl<const N: usize> Visitor<'_> for TextVisitor<N> {
            type Value = Text<N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Text<N>, E> {
                Ok(Text::new(v))
            }
        }

        deserializer.deserialize_str(TextVisitor::<N>)
    }
}

/// Notification lines: the first [`MAX_LINES`] entries, the rest skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lines(pub Vec<Text<LINE_LEN>, MAX_LINES>);

impl<'de> Deserialize<'de> for Lines {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinesVisitor;

        impl<'de> Visitor<'de> for LinesVisitor {
            type Value = Lines;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array of strings")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Lines, A::Error> {
                let mut lines = Vec::new();
                while !lines.is_full() {
                    match seq.next_element::<Text<LINE_LEN>>()? {
                        Some(line) => {
                            let _ = lines.push(line);
                        }
                        None => return Ok(Lines(lines)),
                    }
                }
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(Lines(lines))
            }
        }

        deserializer.deserialize_seq(LinesVisitor)
    }
}

/// A notification pushed by the companion app.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NotificationPayload {
    #[serde(default)]
    pub app: Text<24>,
    /// Timestamp as sent by the app, e.g. `2024-05-01 12:34:56`.
    #[serde(default)]
    pub time: Text<24>,
    #[serde(default, rename = "texts")]
    pub lines: Lines,
}

/// Audio levels reported alongside a media update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct AudioLevels {
    #[serde(default)]
    pub amplitude: f32,
    #[serde(default)]
    pub peak: f32,
    #[serde(default)]
    pub rms: f32,
}

/// A media (now playing / audio level) update.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MediaPayload {
    #[serde(default)]
    pub title: Text<48>,
    #[serde(default)]
    pub artist: Text<48>,
    #[serde(default)]
    pub status: Text<16>,
    #[serde(default, rename = "is_playing")]
    pub playing: bool,
    #[serde(default, rename = "audio_amplitude")]
    pub levels: Option<AudioLevels>,
}

impl MediaPayload {
    /// Amplitude of this update, zero when the app sent no levels.
    pub fn amplitude(&self) -> f32 {
        self.levels.map_or(0.0, |l| l.amplitude)
    }
}

/// Classified message from the companion app.
#[derive(Clone, Debug, PartialEq)]
pub enum IncomingEvent {
    Notification(NotificationPayload),
    Media(MediaPayload),
    /// Well-formed document with an unknown `type`.
    Unrecognized,
    /// Not a decodable document.
    DecodeError,
}

#[derive(Deserialize)]
struct Header {
    #[serde(default, rename = "type")]
    kind: Option<Text<16>>,
}

/// Any JSON object; every field is skipped.
#[derive(Deserialize)]
struct AnyObject {}

/// Classify a raw message.  Never fails; undecodable text is reported as
/// [`IncomingEvent::DecodeError`].
pub fn classify(text: &str) -> IncomingEvent {
    match decode(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Dropping undecodable message ({} bytes): {:?}", text.len(), e);
            IncomingEvent::DecodeError
        }
    }
}

/// Decode a raw message into an event.
pub fn decode(text: &str) -> Result<IncomingEvent, Error> {
    let document = unwrap_quoted(text.trim())?;
    let mut scratch = [0u8; MAX_MESSAGE_LEN];

    let header = match serde_json_core::from_str_escaped::<Header>(&document, &mut scratch) {
        Ok((header, _)) => header,
        // A `type` that is not a string still leaves a well-formed document.
        Err(e) => {
            serde_json_core::from_str_escaped::<AnyObject>(&document, &mut scratch).map_err(|_| e)?;
            return Ok(IncomingEvent::Unrecognized);
        }
    };

    let event = match header.kind.as_deref() {
        Some("notification") => {
            let (payload, _) = serde_json_core::from_str_escaped(&document, &mut scratch)?;
            IncomingEvent::Notification(payload)
        }
        Some("media") => {
            let (payload, _) = serde_json_core::from_str_escaped(&document, &mut scratch)?;
            IncomingEvent::Media(payload)
        }
        _ => IncomingEvent::Unrecognized,
    };

    Ok(event)
}

/// Strip one layer of wrapping quotes and un-escape the inner quotes.
fn unwrap_quoted(text: &str) -> Result<String<MAX_MESSAGE_LEN>, Error> {
    let inner = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner,
        None => {
            let mut out = String::new();
            out.push_str(text).map_err(|_| Error::PayloadTooLarge)?;
            return Ok(out);
        }
    };

    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        let c = if c == '\\' && chars.peek() == Some(&'"') {
            chars.next().unwrap_or('"')
        } else {
            c
        };
        out.push(c).map_err(|_| Error::PayloadTooLarge)?;
    }
    Ok(out)
}
