//! Data carried across the capture-driver boundary.

use chrono::{DateTime, Utc};
use ridgescan_core::{
    Error, Result, StatusCode,
    constants::{MAX_IDENTIFY_KEY_BYTES, MAX_TEMPLATE_QUALITY},
};
use serde::{Deserialize, Serialize};

/// A fingerprint template produced by a capture, with its quality score and
/// capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedTemplate {
    /// Opaque engine-format template bytes.
    pub bytes: Vec<u8>,
    /// Quality score 1-10, or 0 when the engine reported none.
    pub quality: u8,
    /// When the capture finished.
    pub captured_at: DateTime<Utc>,
}

impl CapturedTemplate {
    /// Create a captured template stamped with the current time.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the quality score is above 10.
    pub fn new(bytes: Vec<u8>, quality: u8) -> Result<Self> {
        CapturedTemplateBuilder::new(bytes, quality).build()
    }

    /// Create a builder for a captured template with an explicit timestamp.
    ///
    /// Useful in tests and when replaying recorded captures.
    ///
    /// # Examples
    ///
    /// ```
    /// use ridgescan_device::types::CapturedTemplate;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let when = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    /// let template = CapturedTemplate::builder(vec![1, 2, 3], 8)
    ///     .timestamp(when)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(template.captured_at, when);
    /// ```
    pub fn builder(bytes: Vec<u8>, quality: u8) -> CapturedTemplateBuilder {
        CapturedTemplateBuilder::new(bytes, quality)
    }
}

/// Builder for [`CapturedTemplate`] with an optional custom timestamp.
#[derive(Debug)]
pub struct CapturedTemplateBuilder {
    bytes: Vec<u8>,
    quality: u8,
    captured_at: Option<DateTime<Utc>>,
}

impl CapturedTemplateBuilder {
    fn new(bytes: Vec<u8>, quality: u8) -> Self {
        CapturedTemplateBuilder {
            bytes,
            quality,
            captured_at: None,
        }
    }

    /// Set an explicit capture timestamp instead of the current time.
    #[must_use]
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    /// Build the template, validating the quality score.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the quality score is above 10.
    pub fn build(self) -> Result<CapturedTemplate> {
        if self.quality > MAX_TEMPLATE_QUALITY {
            return Err(Error::invalid_argument(format!(
                "Template quality must be 0-{MAX_TEMPLATE_QUALITY}, got {}",
                self.quality
            )));
        }
        Ok(CapturedTemplate {
            bytes: self.bytes,
            quality: self.quality,
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Result of an enrollment engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollReply {
    /// Engine outcome code.
    pub status: StatusCode,
    /// The enrolled template, present only on success.
    pub capture: Option<CapturedTemplate>,
}

impl EnrollReply {
    /// Successful enrollment carrying its template.
    #[must_use]
    pub fn ok(capture: CapturedTemplate) -> Self {
        EnrollReply {
            status: StatusCode::Ok,
            capture: Some(capture),
        }
    }

    /// Failed enrollment with the engine's outcome code.
    #[must_use]
    pub fn failed(status: StatusCode) -> Self {
        EnrollReply {
            status,
            capture: None,
        }
    }

    /// Enrollment stopped through the progress callback.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::failed(StatusCode::CanceledByUser)
    }
}

/// Result of a verification engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReply {
    /// Engine outcome code.
    pub status: StatusCode,
    /// Whether the live sample matched the base template.
    pub matched: bool,
    /// FAR value the comparison actually ran with.
    pub far_used: i32,
}

impl VerifyReply {
    /// Completed verification with its match result.
    #[must_use]
    pub fn ok(matched: bool, far_used: i32) -> Self {
        VerifyReply {
            status: StatusCode::Ok,
            matched,
            far_used,
        }
    }

    /// Failed verification with the engine's outcome code.
    #[must_use]
    pub fn failed(status: StatusCode) -> Self {
        VerifyReply {
            status,
            matched: false,
            far_used: 0,
        }
    }

    /// Verification stopped through the progress callback.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::failed(StatusCode::CanceledByUser)
    }
}

/// Result of a base-template acquisition engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseTemplateReply {
    /// Engine outcome code.
    pub status: StatusCode,
    /// The acquired base template, present only on success.
    pub template: Option<Vec<u8>>,
}

impl BaseTemplateReply {
    /// Successful acquisition carrying the base template.
    #[must_use]
    pub fn ok(template: Vec<u8>) -> Self {
        BaseTemplateReply {
            status: StatusCode::Ok,
            template: Some(template),
        }
    }

    /// Failed acquisition with the engine's outcome code.
    #[must_use]
    pub fn failed(status: StatusCode) -> Self {
        BaseTemplateReply {
            status,
            template: None,
        }
    }

    /// Acquisition stopped through the progress callback.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::failed(StatusCode::CanceledByUser)
    }
}

/// One candidate in an identification run: a caller-chosen key and the
/// stored template it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyRecord {
    /// Caller-chosen record key, at most 16 bytes.
    pub key: Vec<u8>,
    /// Stored engine-format template.
    pub template: Vec<u8>,
}

impl IdentifyRecord {
    /// Create an identification record.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the key is longer than 16 bytes
    /// or the template is empty.
    pub fn new(key: Vec<u8>, template: Vec<u8>) -> Result<Self> {
        if key.len() > MAX_IDENTIFY_KEY_BYTES {
            return Err(Error::invalid_argument(format!(
                "Record key must be at most {MAX_IDENTIFY_KEY_BYTES} bytes, got {}",
                key.len()
            )));
        }
        if template.is_empty() {
            return Err(Error::invalid_argument("Record template is empty"));
        }
        Ok(IdentifyRecord { key, template })
    }
}

/// Result of an identification engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyReply {
    /// Engine outcome code.
    pub status: StatusCode,
    /// Index of the matched record, -1 when nothing matched.
    pub index: i32,
}

impl IdentifyReply {
    /// Successful identification that matched the record at `index`.
    #[must_use]
    pub fn matched(index: i32) -> Self {
        IdentifyReply {
            status: StatusCode::Ok,
            index,
        }
    }

    /// Successful identification that matched nothing.
    #[must_use]
    pub fn no_match() -> Self {
        IdentifyReply {
            status: StatusCode::Ok,
            index: -1,
        }
    }

    /// Failed identification with the engine's outcome code.
    #[must_use]
    pub fn failed(status: StatusCode) -> Self {
        IdentifyReply { status, index: -1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captured_template_validates_quality() {
        assert!(CapturedTemplate::new(vec![1, 2, 3], 0).is_ok());
        assert!(CapturedTemplate::new(vec![1, 2, 3], 10).is_ok());
        assert!(CapturedTemplate::new(vec![1, 2, 3], 11).is_err());
    }

    #[test]
    fn test_identify_record_limits() {
        assert!(IdentifyRecord::new(vec![1; 16], vec![9]).is_ok());
        assert!(IdentifyRecord::new(vec![1; 17], vec![9]).is_err());
        assert!(IdentifyRecord::new(b"user-1".to_vec(), Vec::new()).is_err());
        assert!(IdentifyRecord::new(Vec::new(), vec![9]).is_ok());
    }

    #[test]
    fn test_reply_constructors() {
        let enroll = EnrollReply::cancelled();
        assert_eq!(enroll.status, StatusCode::CanceledByUser);
        assert!(enroll.capture.is_none());

        let verify = VerifyReply::ok(true, 166);
        assert!(verify.status.is_ok());
        assert!(verify.matched);
        assert_eq!(verify.far_used, 166);

        let identify = IdentifyReply::no_match();
        assert!(identify.status.is_ok());
        assert_eq!(identify.index, -1);
    }
}
