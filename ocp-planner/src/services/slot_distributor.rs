//! Weekly Slot Distributor
//!
//! Splits the week's post count across Sunday(0)..Saturday(6).
//!
//! # Policy
//! - Weekdays weigh more than weekends (see [`DAY_WEIGHTS`])
//! - total <= 3: largest-remainder proportional allocation
//! - total == 4: one post each Monday through Thursday
//! - total == 5: Monday, Tuesday, Wednesday, Friday, Saturday (Thursday and
//!   Sunday skipped so low-volume weeks still reach the weekend)
//! - total >= 6: floor of the weighted share, then the remainder one unit
//!   at a time to the least-filled day, ties to the heavier day
//!
//! Fully deterministic; ties that survive the weight comparison go to the
//! earlier day.

use ocp_common::time::DAYS_PER_WEEK;
use std::cmp::Ordering;

/// Relative posting weight, Sunday first
pub const DAY_WEIGHTS: [f64; DAYS_PER_WEEK] = [0.7, 1.2, 1.2, 1.2, 1.2, 1.1, 0.9];

/// Posts per day, Sunday first
pub type WeekSlots = [u32; DAYS_PER_WEEK];

/// Distribute `total` posts across the week
pub fn distribute(total: u32) -> WeekSlots {
    match total {
        0 => [0; DAYS_PER_WEEK],
        1..=3 => largest_remainder(total),
        4 => [0, 1, 1, 1, 1, 0, 0],
        5 => [0, 1, 1, 1, 0, 1, 1],
        _ => floor_then_least_filled(total),
    }
}

fn weighted_quotas(total: u32) -> [f64; DAYS_PER_WEEK] {
    let weight_sum: f64 = DAY_WEIGHTS.iter().sum();
    let mut quotas = [0.0; DAYS_PER_WEEK];
    for (day, weight) in DAY_WEIGHTS.iter().enumerate() {
        quotas[day] = total as f64 * weight / weight_sum;
    }
    quotas
}

fn by_weight_then_day(a: usize, b: usize) -> Ordering {
    DAY_WEIGHTS[b]
        .partial_cmp(&DAY_WEIGHTS[a])
        .unwrap_or(Ordering::Equal)
        .then(a.cmp(&b))
}

fn largest_remainder(total: u32) -> WeekSlots {
    let quotas = weighted_quotas(total);
    let mut slots = [0u32; DAYS_PER_WEEK];
    for (day, quota) in quotas.iter().enumerate() {
        slots[day] = quota.floor() as u32;
    }

    let mut order: Vec<usize> = (0..DAYS_PER_WEEK).collect();
    order.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.partial_cmp(&ra)
            .unwrap_or(Ordering::Equal)
            .then_with(|| by_weight_then_day(a, b))
    });

    let assigned: u32 = slots.iter().sum();
    for &day in order.iter().cycle().take((total - assigned) as usize) {
        slots[day] += 1;
    }
    slots
}

fn floor_then_least_filled(total: u32) -> WeekSlots {
    let quotas = weighted_quotas(total);
    let mut slots = [0u32; DAYS_PER_WEEK];
    for (day, quota) in quotas.iter().enumerate() {
        slots[day] = quota.floor() as u32;
    }

    let mut remaining = total - slots.iter().sum::<u32>();
    while remaining > 0 {
        let day = (0..DAYS_PER_WEEK)
            .min_by(|&a, &b| slots[a].cmp(&slots[b]).then_with(|| by_weight_then_day(a, b)))
            .unwrap_or(1);
        slots[day] += 1;
        remaining -= 1;
    }
    slots
}
