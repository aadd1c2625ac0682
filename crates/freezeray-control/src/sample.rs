//! 遥测行

use freezeray_protocol::AlarmBits;

/// 缺失字段在日志中的占位
pub const MISSING: &str = "NA";

/// 日志表头（列顺序与 `SampleRow` 字段顺序一致）
pub const HEADER: [&str; 12] = [
    "Time_Stamp",
    "SP_Temp",
    "SP_SetPoint",
    "HS_Temp",
    "TC_Effort",
    "TC_Alarm",
    "Ard_Temp",
    "Fan_Effort",
    "Air_Pump_Effort",
    "Vol_Infused",
    "Vol_Withdrawn",
    "Vol_Units",
];

/// 一次采样的结果
///
/// 任一查询失败时对应字段为 `None`，该行仍然输出。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleRow {
    /// 自运行开始的整秒数
    pub t: u64,
    pub sp_temp: Option<f64>,
    pub sp_setpoint: Option<f64>,
    pub heatsink_temp: Option<f64>,
    pub tc_effort_pct: Option<f64>,
    pub alarm_bits: Option<AlarmBits>,
    /// 固件回传的占位温度
    pub ard_temp: Option<f64>,
    pub fan_effort_pct: Option<f64>,
    pub pump_effort_pct: Option<f64>,
    pub vol_infused: Option<f64>,
    pub vol_withdrawn: Option<f64>,
    pub vol_units: Option<String>,
}

impl SampleRow {
    pub fn new(t: u64) -> Self {
        Self {
            t,
            ..Default::default()
        }
    }

    /// 缺失的字段数
    pub fn missing_fields(&self) -> usize {
        self.to_record().iter().filter(|f| *f == MISSING).count()
    }

    /// 按表头顺序格式化，缺失字段写 `NA`
    pub fn to_record(&self) -> [String; 12] {
        fn num(v: Option<f64>) -> String {
            v.map_or_else(|| MISSING.to_string(), |v| v.to_string())
        }

        [
            self.t.to_string(),
            num(self.sp_temp),
            num(self.sp_setpoint),
            num(self.heatsink_temp),
            num(self.tc_effort_pct),
            self.alarm_bits
                .map_or_else(|| MISSING.to_string(), |b| b.to_string()),
            num(self.ard_temp),
            num(self.fan_effort_pct),
            num(self.pump_effort_pct),
            num(self.vol_infused),
            num(self.vol_withdrawn),
            self.vol_units.clone().unwrap_or_else(|| MISSING.to_string()),
        ]
    }
}
