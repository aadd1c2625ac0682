//! 配方
//!
//! 文本格式：一行表头，随后每行 8 个字段
//!
//! ```text
//! dwell, tc_enabled(Y/N), setpoint_c, fan_pct, pump_air_pct,
//! syringe_volume_ul, syringe_rate_ul_min, wait_for_resume(Y/N)
//! ```
//!
//! 以 `#` 开头的整行，以及第 8 个字段之后以 `#` 开头的字段均为注释。

use crate::error::RecipeError;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// 单个配方步骤（解析后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub dwell: Duration,
    pub tc_enabled: bool,
    pub setpoint_c: f64,
    /// 0-100
    pub fan_pct: u8,
    /// 0-100
    pub pump_air_pct: u8,
    /// 带符号：负数为抽吸，0 表示本步不发送泵命令
    pub syringe_volume_ul: f64,
    pub syringe_rate_ul_min: f64,
    pub wait_for_resume: bool,
}

impl StepRecord {
    pub fn dispenses(&self) -> bool {
        self.syringe_volume_ul != 0.0
    }
}

/// 有序步骤序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    steps: Vec<StepRecord>,
}

const FIELD_COUNT: usize = 8;

impl Recipe {
    pub fn new(steps: Vec<StepRecord>) -> Self {
        Self { steps }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RecipeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn parse_str(text: &str) -> Result<Self, RecipeError> {
        Self::from_reader(text.as_bytes())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RecipeError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(reader);

        if reader.headers()?.is_empty() {
            return Err(RecipeError::MissingHeader);
        }

        let mut steps = Vec::new();
        let mut total = Duration::ZERO;
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let fields: Vec<&str> = record
                .iter()
                .take_while(|f| !f.starts_with('#'))
                .collect();
            // 空行
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }
            if fields.len() != FIELD_COUNT {
                return Err(RecipeError::FieldCount {
                    line,
                    found: fields.len(),
                });
            }
            let step = parse_step(line, &fields)?;
            total = total
                .checked_add(step.dwell)
                .ok_or_else(|| RecipeError::InvalidField {
                    line,
                    field: "dwell",
                    value: fields[0].to_string(),
                    reason: "total recipe dwell overflows".into(),
                })?;
            steps.push(step);
        }

        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 所有步骤驻留时间之和（溢出时取最大值）
    pub fn total_dwell(&self) -> Duration {
        self.steps
            .iter()
            .fold(Duration::ZERO, |acc, s| acc.saturating_add(s.dwell))
    }
}

impl<'a> IntoIterator for &'a Recipe {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

fn parse_step(line: u64, f: &[&str]) -> Result<StepRecord, RecipeError> {
    let invalid = |field: &'static str, value: &str, reason: String| RecipeError::InvalidField {
        line,
        field,
        value: value.to_string(),
        reason,
    };

    let dwell = parse_duration(f[0]).map_err(|e| invalid("dwell", f[0], e.to_string()))?;
    Ok(StepRecord {
        dwell,
        tc_enabled: parse_flag(f[1]).ok_or_else(|| invalid("tc_enabled", f[1], "expected Y or N".into()))?,
        setpoint_c: parse_number(f[2]).map_err(|r| invalid("setpoint_c", f[2], r))?,
        fan_pct: parse_pct(f[3]).map_err(|r| invalid("fan_pct", f[3], r))?,
        pump_air_pct: parse_pct(f[4]).map_err(|r| invalid("pump_air_pct", f[4], r))?,
        syringe_volume_ul: parse_number(f[5]).map_err(|r| invalid("syringe_volume_ul", f[5], r))?,
        syringe_rate_ul_min: parse_number(f[6])
            .map_err(|r| invalid("syringe_rate_ul_min", f[6], r))?,
        wait_for_resume: parse_flag(f[7])
            .ok_or_else(|| invalid("wait_for_resume", f[7], "expected Y or N".into()))?,
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "Y" | "y" => Some(true),
        "N" | "n" => Some(false),
        _ => None,
    }
}

fn parse_number(value: &str) -> Result<f64, String> {
    let n: f64 = value.parse().map_err(|e: std::num::ParseFloatError| e.to_string())?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err("not a finite number".into())
    }
}

fn parse_pct(value: &str) -> Result<u8, String> {
    let n: u8 = value.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
    if n > 100 {
        return Err("must be 0-100".into());
    }
    Ok(n)
}

/// 解析 `(<n>h)?-?(<n>m)?-?(<n>s)?`，缺省的单位计 0
///
/// `"10h-10m-10s"` → 36610s，`"7m-9s"` → 429s，空串 → 0
pub fn parse_duration(text: &str) -> Result<Duration, RecipeError> {
    let invalid = || RecipeError::InvalidDuration(text.to_string());
    let mut rest = text.trim();
    let mut total: u64 = 0;
    // 单位必须按 h → m → s 顺序出现且不重复
    let mut units = ['h', 'm', 's'].into_iter().zip([3600u64, 60, 1]);
    // 分隔符只能出现在 m/s 之前，且每处最多一个
    let mut dashed = false;

    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('-') {
            if dashed {
                return Err(invalid());
            }
            dashed = true;
            rest = stripped;
            continue;
        }

        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let n: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        let unit = rest[digits..].chars().next().ok_or_else(invalid)?;
        if dashed && unit == 'h' {
            return Err(invalid());
        }
        dashed = false;
        let scale = loop {
            match units.next() {
                Some((u, scale)) if u == unit => break scale,
                Some(_) => continue,
                None => return Err(invalid()),
            }
        };
        total = n
            .checked_mul(scale)
            .and_then(|s| total.checked_add(s))
            .ok_or_else(invalid)?;

        rest = &rest[digits + unit.len_utf8()..];
    }

    Ok(Duration::from_secs(total))
}

/// 按同一语法输出，省略为 0 的单位；0 输出 `0s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let parts: Vec<String> = [(secs / 3600, 'h'), (secs / 60 % 60, 'm'), (secs % 60, 's')]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{}{}", n, unit))
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_reference_values() {
        let cases = [
            ("10h-10m-10s", 36610),
            ("3s", 3),
            ("7m-9s", 429),
            ("1h-5s", 3605),
            ("", 0),
            ("2h", 7200),
            ("1m30s", 90),
            ("1h-", 3600),
            ("5m-", 300),
            ("-5m", 300),
        ];
        for (text, secs) in cases {
            assert_eq!(parse_duration(text).unwrap(), Duration::from_secs(secs), "{}", text);
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(36610)), "10h-10m-10s");
        assert_eq!(format_duration(Duration::from_secs(3605)), "1h-5s");
        assert_eq!(format_duration(Duration::ZERO), "0s");
        let text = format_duration(Duration::from_secs(429));
        assert_eq!(parse_duration(&text).unwrap(), Duration::from_secs(429));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for text in ["10", "h", "5s-1m", "1m-1m", "3x", "1h--", "-1h", "1.5s"] {
            assert!(parse_duration(text).is_err(), "{:?} should be rejected", text);
        }
    }

    const RECIPE: &str = "\
dwell,tc,setpoint,fan,air,volume,rate,wait
# cool down
10s,Y,-5.5,100,50,0,0,N
1m-30s,N,20,0,0,-500,1000,Y,# withdraw sample

3s,y,4,10,10,250.5,500,n
";

    #[test]
    fn test_parse_recipe() {
        let recipe = Recipe::parse_str(RECIPE).unwrap();
        assert_eq!(recipe.len(), 3);

        let first = &recipe.steps()[0];
        assert_eq!(first.dwell, Duration::from_secs(10));
        assert!(first.tc_enabled);
        assert_eq!(first.setpoint_c, -5.5);
        assert_eq!(first.fan_pct, 100);
        assert_eq!(first.pump_air_pct, 50);
        assert!(!first.dispenses());
        assert!(!first.wait_for_resume);

        let second = &recipe.steps()[1];
        assert_eq!(second.dwell, Duration::from_secs(90));
        assert_eq!(second.syringe_volume_ul, -500.0);
        assert!(second.wait_for_resume);

        assert_eq!(recipe.total_dwell(), Duration::from_secs(103));
    }

    #[test]
    fn test_recipe_field_errors() {
        let short = "h\n10s,Y,1,2,3\n";
        assert!(matches!(
            Recipe::parse_str(short),
            Err(RecipeError::FieldCount { found: 5, .. })
        ));

        let bad_flag = "h\n10s,maybe,1,2,3,0,0,N\n";
        assert!(matches!(
            Recipe::parse_str(bad_flag),
            Err(RecipeError::InvalidField { field: "tc_enabled", .. })
        ));

        let bad_pct = "h\n10s,Y,1,101,3,0,0,N\n";
        assert!(matches!(
            Recipe::parse_str(bad_pct),
            Err(RecipeError::InvalidField { field: "fan_pct", .. })
        ));
    }

    #[test]
    fn test_recipe_total_dwell_overflow_is_rejected() {
        let huge = "h\n5000000000000000h,N,0,0,0,0,0,N\n5000000000000000h,N,0,0,0,0,0,N\n";
        assert!(matches!(
            Recipe::parse_str(huge),
            Err(RecipeError::InvalidField { line: 3, field: "dwell", .. })
        ));

        let step = Recipe::parse_str("h\n5000000000000000h,N,0,0,0,0,0,N\n")
            .unwrap()
            .steps()[0]
            .clone();
        let recipe = Recipe::new(vec![step.clone(), step]);
        assert_eq!(recipe.total_dwell(), Duration::MAX);
    }

    #[test]
    fn test_header_only_recipe_is_empty() {
        let recipe = Recipe::parse_str("dwell,tc,sp,fan,air,vol,rate,wait\n").unwrap();
        assert!(recipe.is_empty());
    }
}
