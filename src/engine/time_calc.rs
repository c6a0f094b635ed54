// ==========================================
// 车间工单重排系统 - 工时推进计算器
// ==========================================
// 职责: 给定开始时刻与作业分钟数, 在班次日历与检修窗口约束下
//       计算作业完成时刻
// 算法: 沿约束边界迭代推进 (班次结束/窗口开始/窗口结束),
//       不按分钟逐步扫描
// 红线: "无法落位"是信号值而非异常, 调用方必须处理
// ==========================================
// 口径:
// - 班次为周循环半开区间 [start_hour, end_hour), 跨午夜时延伸至次日;
// - 检修优先于班次: 窗口生效期间不推进工时;
// - 班次集合为空时, 除检修窗口外全时可推进;
// - 窗口结束与班次开始相接时不阻断, 工时恰好在相接时刻恢复推进。
// ==========================================

use chrono::{DateTime, Datelike, Duration, NaiveTime, Timelike, Utc};
use thiserror::Error;

use crate::config::ReflowConfig;
use crate::domain::instant::{add_minutes, minutes_between};
use crate::domain::work_center::{MaintenanceInterval, Shift};

// ==========================================
// CannotPlace - 无法落位信号
// ==========================================
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannotPlace {
    /// 前瞻天数内找不到任何可用班次
    #[error("前瞻{lookahead_days}天内无可用班次: from={from}")]
    NoShiftWithinLookahead {
        from: DateTime<Utc>,
        lookahead_days: i64,
    },

    /// 推进迭代超过硬上限 (病态日历兜底)
    #[error("工时推进迭代超过上限: cap={cap}")]
    IterationCapExceeded { cap: u32 },
}

// ==========================================
// WorkTimeCalculator - 工时推进计算器
// ==========================================
pub struct WorkTimeCalculator {
    max_iterations: u32,
    lookahead_days: i64,
}

impl WorkTimeCalculator {
    /// 创建计算器实例
    pub fn new(config: &ReflowConfig) -> Self {
        Self {
            max_iterations: config.max_calc_iterations,
            lookahead_days: config.shift_lookahead_days,
        }
    }

    /// 计算作业完成时刻
    ///
    /// # 参数
    /// - `start`: 作业开始时刻
    /// - `duration_minutes`: 作业分钟数 (> 0; 非正值按原地完成容错)
    /// - `shifts`: 周班次集合 (可为空; 非法/空班次在此剔除)
    /// - `windows`: 检修窗口序列 (可为空)
    ///
    /// # 返回
    /// - `Ok(end)`: 自 start 起恰好推进 duration_minutes 个工作分钟后的时刻
    /// - `Err(CannotPlace)`: 日历内无法完成该作业
    pub fn completion_time(
        &self,
        start: DateTime<Utc>,
        duration_minutes: i64,
        shifts: &[Shift],
        windows: &[MaintenanceInterval],
    ) -> Result<DateTime<Utc>, CannotPlace> {
        let usable: Vec<Shift> = shifts
            .iter()
            .filter(|s| s.is_valid() && !s.is_empty())
            .copied()
            .collect();

        let mut t = start;
        let mut remaining = duration_minutes;

        if remaining <= 0 {
            return Ok(t);
        }

        // 完全无约束: 线性推进
        if usable.is_empty() && windows.is_empty() {
            return Ok(add_minutes(t, remaining));
        }

        for _ in 0..self.max_iterations {
            // ----- 1) 处于检修窗口内: 跳至窗口结束 -----
            if let Some(window) = window_containing(t, windows) {
                t = window.end;
                continue;
            }

            // ----- 2) 无班次日历: 仅受检修窗口约束 -----
            if usable.is_empty() {
                match next_window_after(t, windows) {
                    None => return Ok(add_minutes(t, remaining)),
                    Some(window) => {
                        let available = minutes_between(t, window.start);
                        if remaining <= available {
                            return Ok(add_minutes(t, remaining));
                        }
                        remaining -= available;
                        t = window.end;
                    }
                }
                continue;
            }

            // ----- 3) 班次日历推进 -----
            match active_shift_end(t, &usable) {
                Some(shift_end) => {
                    // 有效边界 = min(班次结束, 下一个检修窗口开始)
                    let boundary_window =
                        next_window_after(t, windows).filter(|w| w.start < shift_end);
                    let boundary = boundary_window.map(|w| w.start).unwrap_or(shift_end);

                    let available = minutes_between(t, boundary);
                    if available <= 0 {
                        // 班次余量不足一分钟: 直接推进到边界
                        t = boundary;
                        continue;
                    }

                    let worked = remaining.min(available);
                    t = add_minutes(t, worked);
                    remaining -= worked;
                    if remaining == 0 {
                        return Ok(t);
                    }

                    // 工时未尽: 越过边界继续
                    match boundary_window {
                        Some(window) => t = window.end,
                        None => t = boundary,
                    }
                }
                None => {
                    // 班次外: 定位下一个班次开始;
                    // 若有检修窗口先于其开始, 则先跳至该窗口结束
                    let next_start = self.next_shift_start_after(t, &usable).ok_or(
                        CannotPlace::NoShiftWithinLookahead {
                            from: t,
                            lookahead_days: self.lookahead_days,
                        },
                    )?;
                    match next_window_after(t, windows).filter(|w| w.start < next_start) {
                        Some(window) => t = window.end,
                        None => t = next_start,
                    }
                }
            }
        }

        Err(CannotPlace::IterationCapExceeded {
            cap: self.max_iterations,
        })
    }

    /// 定位严格晚于 t 的下一个班次开始时刻
    ///
    /// 先找当日 (仅计开始时刻晚于 t 的班次), 再逐日前瞻;
    /// 同日多个候选取最早者。超出前瞻天数返回 None。
    fn next_shift_start_after(&self, t: DateTime<Utc>, shifts: &[Shift]) -> Option<DateTime<Utc>> {
        for offset in 0..=self.lookahead_days {
            let day = day_start(t) + Duration::days(offset);
            let weekday = day.weekday().number_from_monday();
            let mut best: Option<DateTime<Utc>> = None;
            for shift in shifts.iter().filter(|s| s.day_of_week == weekday) {
                let candidate = day + Duration::hours(shift.start_hour as i64);
                if candidate > t && best.map_or(true, |b| candidate < b) {
                    best = Some(candidate);
                }
            }
            if best.is_some() {
                return best;
            }
        }
        None
    }
}

// ==========================================
// 班次/窗口几何辅助
// ==========================================

/// 当日零点 (UTC)
fn day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// t 所在班次的结束时刻; 不在任何班次内返回 None
///
/// 跨午夜班次拆为两段判定: 当日 [start, 24:00) 晚段与次日 [0:00, end) 早段。
/// 多个班次同时覆盖 t 时取最晚结束, 保证连续推进最大化。
fn active_shift_end(t: DateTime<Utc>, shifts: &[Shift]) -> Option<DateTime<Utc>> {
    let weekday = t.weekday().number_from_monday();
    let second_of_day = t.time().num_seconds_from_midnight() as i64;
    let mut latest_end: Option<DateTime<Utc>> = None;

    for shift in shifts {
        let start_sec = shift.start_hour as i64 * 3600;
        let end_sec = shift.end_hour as i64 * 3600;

        let end_instant = if !shift.spans_midnight() {
            if weekday == shift.day_of_week && second_of_day >= start_sec && second_of_day < end_sec
            {
                // 普通班次: 当日 end_hour (24 即次日零点)
                Some(day_start(t) + Duration::hours(shift.end_hour as i64))
            } else {
                None
            }
        } else {
            let next_day = if shift.day_of_week == 7 {
                1
            } else {
                shift.day_of_week + 1
            };
            if weekday == shift.day_of_week && second_of_day >= start_sec {
                // 晚段: 结束于次日 end_hour
                Some(day_start(t) + Duration::days(1) + Duration::hours(shift.end_hour as i64))
            } else if weekday == next_day && second_of_day < end_sec {
                // 早段: 结束于当日 end_hour
                Some(day_start(t) + Duration::hours(shift.end_hour as i64))
            } else {
                None
            }
        };

        if let Some(end) = end_instant {
            if latest_end.map_or(true, |cur| end > cur) {
                latest_end = Some(end);
            }
        }
    }
    latest_end
}

/// 包含 t 的检修窗口
fn window_containing(
    t: DateTime<Utc>,
    windows: &[MaintenanceInterval],
) -> Option<&MaintenanceInterval> {
    windows.iter().find(|w| w.contains(t))
}

/// 开始时刻严格晚于 t 的最早检修窗口
fn next_window_after(
    t: DateTime<Utc>,
    windows: &[MaintenanceInterval],
) -> Option<&MaintenanceInterval> {
    windows
        .iter()
        .filter(|w| w.start > t)
        .min_by_key(|w| w.start)
}
