use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AppendBatch, LogLevel, Segment, SegmentFields, SpanId};

/// Error decoding a wire payload.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A log list could not be parsed.
    #[error("invalid log list on line {line}: {message}")]
    Json { line: usize, message: String },

    /// A log list could not be encoded.
    #[error("failed to encode log list: {0}")]
    Encode(String),
}

/// Span metadata on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanDto {
    #[serde(default)]
    pub manifest_name: String,
}

/// Segment on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anchor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<SegmentFields>,
}

/// One ingestion batch as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogList {
    #[serde(default)]
    pub spans: BTreeMap<String, SpanDto>,
    #[serde(default)]
    pub segments: Vec<SegmentDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_checkpoint: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_checkpoint: Option<i64>,
}

impl LogList {
    /// Parse a single JSON document.
    pub fn from_json(input: &str) -> Result<Self, ContractError> {
        serde_json::from_str(input).map_err(|e| ContractError::Json {
            line: e.line(),
            message: e.to_string(),
        })
    }

    /// Parse a JSON Lines stream: one log list per non-blank line.
    pub fn parse_json_lines(input: &str) -> Result<Vec<Self>, ContractError> {
        input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|e| ContractError::Json {
                    line: idx + 1,
                    message: e.to_string(),
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ContractError> {
        serde_json::to_string(self).map_err(|e| ContractError::Encode(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ContractError> {
        serde_json::to_string_pretty(self).map_err(|e| ContractError::Encode(e.to_string()))
    }
}

impl From<SegmentDto> for Segment {
    fn from(dto: SegmentDto) -> Self {
        Self {
            span_id: SpanId::new(dto.span_id.unwrap_or_default()),
            text: dto.text,
            time: dto.time.unwrap_or_default(),
            level: dto.level.unwrap_or_default(),
            anchor: dto.anchor,
            fields: dto.fields.unwrap_or_default(),
        }
    }
}

impl From<&Segment> for SegmentDto {
    fn from(segment: &Segment) -> Self {
        Self {
            span_id: Some(segment.span_id.to_string()),
            text: segment.text.clone(),
            time: (!segment.time.is_empty()).then(|| segment.time.clone()),
            level: Some(segment.level),
            anchor: segment.anchor,
            fields: (!segment.fields.is_empty()).then(|| segment.fields.clone()),
        }
    }
}

impl From<LogList> for AppendBatch {
    fn from(list: LogList) -> Self {
        Self {
            spans: list
                .spans
                .into_iter()
                .map(|(id, span)| (SpanId::new(id), span.manifest_name))
                .collect(),
            segments: list.segments.into_iter().map(Segment::from).collect(),
            from_checkpoint: list.from_checkpoint,
            to_checkpoint: list.to_checkpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildEvent;

    #[test]
    fn test_parse_log_list() {
        let list = LogList::from_json(
            r#"{
                "spans": {"build:1": {"manifestName": "fe"}, "": {}},
                "segments": [
                    {"spanId": "build:1", "text": "step 1\n", "level": "WARN", "anchor": true,
                     "fields": {"buildEvent": "init"}},
                    {"text": "global\n"}
                ],
                "fromCheckpoint": 0,
                "toCheckpoint": 2
            }"#,
        )
        .unwrap();

        let batch = AppendBatch::from(list);
        assert_eq!(batch.spans.get(&SpanId::new("build:1")).unwrap(), "fe");
        assert_eq!(batch.spans.get(&SpanId::global()).unwrap(), "");
        assert_eq!(batch.segments.len(), 2);
        assert_eq!(batch.segments[0].level, LogLevel::Warn);
        assert!(batch.segments[0].anchor);
        assert_eq!(
            batch.segments[0].fields.build_event,
            Some(BuildEvent::Init)
        );
        assert!(batch.segments[1].span_id.is_global());
        assert_eq!(batch.segments[1].level, LogLevel::Info);
        assert_eq!(batch.to_checkpoint, Some(2));
    }

    #[test]
    fn test_parse_json_lines_reports_line() {
        let input = "{\"segments\": []}\n\n{not json}\n";
        let err = LogList::parse_json_lines(input).unwrap_err();
        match err {
            ContractError::Json { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_segment_dto_omits_defaults() {
        let seg = Segment::new("pod:fe", "hi\n");
        let json = serde_json::to_value(SegmentDto::from(&seg)).unwrap();
        assert_eq!(json["spanId"], "pod:fe");
        assert_eq!(json["level"], "INFO");
        assert!(json.get("anchor").is_none());
        assert!(json.get("fields").is_none());
        assert!(json.get("time").is_none());
    }
}
