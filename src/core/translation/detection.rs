use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::MalformedReason;

/// 手语类别标识（与显示语言无关）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignId(String);

impl SignId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SignId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SignId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 检测框（像素坐标，左上角 + 宽高）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    fn validate(&self) -> Result<(), MalformedReason> {
        let origin_ok = self.x.is_finite() && self.y.is_finite() && self.x >= 0.0 && self.y >= 0.0;
        if !origin_ok {
            return Err(MalformedReason::NegativeOrigin {
                x: self.x,
                y: self.y,
            });
        }

        let size_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !size_ok {
            return Err(MalformedReason::NonPositiveSize {
                width: self.width,
                height: self.height,
            });
        }

        Ok(())
    }
}

/// 单帧中的一次手语检测
///
/// 由检测器产出后不再修改。JSON 字段名固定为 `label` / `confidence` / `bbox` / `frame`，
/// 兼容检测器原始输出中的 `class` 字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(alias = "class")]
    pub label: SignId,
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// 静态图片固定为第 0 帧
    #[serde(default)]
    pub frame: u64,
}

impl Detection {
    pub fn new(label: impl Into<SignId>, confidence: f64, bbox: BoundingBox, frame: u64) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
            frame,
        }
    }

    pub fn validate(&self) -> Result<(), MalformedReason> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(MalformedReason::ConfidenceOutOfRange(self.confidence));
        }
        self.bbox.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(10.0, 20.0, 100.0, 80.0)
    }

    #[test]
    fn test_detection_creation() {
        let det = Detection::new("merci", 0.8, bbox(), 3);

        assert_eq!(det.label.as_str(), "merci");
        assert_eq!(det.frame, 3);
        assert!((det.bbox.area() - 8000.0).abs() < 1e-9);
        assert!(det.validate().is_ok());
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Detection::new("oui", 0.0, bbox(), 0).validate().is_ok());
        assert!(Detection::new("oui", 1.0, bbox(), 0).validate().is_ok());
        assert_eq!(
            Detection::new("oui", 1.2, bbox(), 0).validate(),
            Err(MalformedReason::ConfidenceOutOfRange(1.2))
        );
        assert!(Detection::new("oui", f64::NAN, bbox(), 0).validate().is_err());
    }

    #[test]
    fn test_bbox_constraints() {
        let negative = Detection::new("non", 0.7, BoundingBox::new(-1.0, 0.0, 10.0, 10.0), 0);
        assert!(matches!(
            negative.validate(),
            Err(MalformedReason::NegativeOrigin { .. })
        ));

        let flat = Detection::new("non", 0.7, BoundingBox::new(0.0, 0.0, 10.0, 0.0), 0);
        assert!(matches!(
            flat.validate(),
            Err(MalformedReason::NonPositiveSize { .. })
        ));
    }

    #[test]
    fn test_json_field_names() {
        let det = Detection::new("bonjour", 0.91, bbox(), 2);
        let value = serde_json::to_value(&det).unwrap();

        assert_eq!(value["label"], "bonjour");
        assert_eq!(value["frame"], 2);
        assert_eq!(value["bbox"]["width"], 100.0);
    }

    #[test]
    fn test_json_accepts_class_alias_and_default_frame() {
        let json = r#"{"class":"eau","confidence":0.75,"bbox":{"x":1,"y":2,"width":3,"height":4}}"#;
        let det: Detection = serde_json::from_str(json).unwrap();

        assert_eq!(det.label, SignId::from("eau"));
        assert_eq!(det.frame, 0);
    }

    #[test]
    fn test_json_rejects_negative_frame() {
        let json = r#"{"label":"eau","confidence":0.75,"bbox":{"x":1,"y":2,"width":3,"height":4},"frame":-1}"#;
        assert!(serde_json::from_str::<Detection>(json).is_err());
    }
}
