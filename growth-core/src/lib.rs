//! Kiểu dữ liệu lõi cho phần tính bách phân vị tăng trưởng nhi khoa.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cấu hình miền tuổi của biểu đồ đường cong tham chiếu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthConfig {
    /// Số tháng tuổi tối đa được vẽ trên biểu đồ (mặc định 24).
    pub curve_months: u32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { curve_months: 24 }
    }
}

/// Giới tính dùng để tra bảng tham chiếu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// Chỉ số tăng trưởng được theo dõi.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    Height,
    HeadCircumference,
}

/// Một điểm tham chiếu (tháng tuổi, min, max) trong bảng chuẩn.
///
/// Trong một chuỗi tham chiếu, `age_months` tăng nghiêm ngặt và
/// `min < max` tại mọi điểm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceDataPoint {
    pub age_months: u32,
    pub min: f64,
    pub max: f64,
}

/// Cặp min/max nội suy hoặc ngoại suy tại một độ tuổi cụ thể.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

/// Năm giá trị bách phân vị suy ra từ một cặp min/max.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileBand {
    pub p3: f64,
    pub p15: f64,
    pub p50: f64,
    pub p85: f64,
    pub p97: f64,
}

/// Nhãn bách phân vị mà một số đo rơi vào.
///
/// Lưu trữ dưới dạng số trần (3/15/50/85/97) để tương thích với
/// dữ liệu lịch sử đã ghi.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(into = "u8", try_from = "u8")]
pub enum Percentile {
    P3,
    P15,
    P50,
    P85,
    P97,
}

impl Percentile {
    /// Giá trị số của nhãn.
    pub fn value(self) -> u8 {
        match self {
            Percentile::P3 => 3,
            Percentile::P15 => 15,
            Percentile::P50 => 50,
            Percentile::P85 => 85,
            Percentile::P97 => 97,
        }
    }
}

impl From<Percentile> for u8 {
    fn from(p: Percentile) -> u8 {
        p.value()
    }
}

impl TryFrom<u8> for Percentile {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Percentile::P3),
            15 => Ok(Percentile::P15),
            50 => Ok(Percentile::P50),
            85 => Ok(Percentile::P85),
            97 => Ok(Percentile::P97),
            other => Err(format!("Nhãn bách phân vị không hợp lệ: {other}")),
        }
    }
}

/// Năm đường cong bách phân vị của một chỉ số, lấy mẫu theo tháng tuổi.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PercentileCurves {
    pub p3: Vec<f64>,
    pub p15: Vec<f64>,
    pub p50: Vec<f64>,
    pub p85: Vec<f64>,
    pub p97: Vec<f64>,
}

/// Bộ đường cong tham chiếu đầy đủ cho một giới tính.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GrowthCurves {
    pub weight: PercentileCurves,
    pub height: PercentileCurves,
    pub head_circumference: PercentileCurves,
}

/// Một lần đo trong lịch sử tăng trưởng của bệnh nhân.
///
/// Mỗi ngày chỉ giữ một bản ghi; lần nhập sau cùng ngày sẽ ghi đè
/// bản ghi trước đó.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    pub age_in_days: u32,
    pub age_formatted: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub head_circumference: Option<f64>,
    pub weight_percentile: Option<Percentile>,
    pub height_percentile: Option<Percentile>,
    pub head_circumference_percentile: Option<Percentile>,
    #[serde(default)]
    pub notes: String,
}

/// Dữ liệu sinh hiệu do form nhập liệu của ứng dụng chủ cung cấp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalsEntry {
    pub date: NaiveDate,
    pub gender: Gender,
    /// Tuổi thô nhập tay, đơn vị được suy luận khi chuyển đổi.
    pub raw_age: String,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub head_circumference: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// Lỗi chung của phần tính tăng trưởng.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    #[error("Không có bảng tham chiếu cho giới tính/chỉ số yêu cầu")]
    UnknownSeries,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Lỗi lưu trữ: {0}")]
    Storage(String),
}

/// Tiện ích tạo lịch sử rỗng (dùng cho mock/testing).
pub fn empty_history() -> Vec<MeasurementRecord> {
    Vec::new()
}
