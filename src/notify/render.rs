//! HTML bodies for Telegram. Only `<b>` and `<pre>` are used, and none of the
//! interpolated labels contain markup characters.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::types::{AlertEvent, AlertLeg};

pub fn render_alert(alert: &AlertEvent, utc_offset_minutes: i32) -> String {
    let time = format_time(alert.fired_at_ns, utc_offset_minutes);
    let mut msg = format!("<b>{}</b>\n\n<pre>", alert.title);

    // Writing into a String cannot fail.
    match &alert.leg {
        AlertLeg::Option {
            option_type,
            strike,
            option_price,
            iv_roc,
            moneyness,
            activity,
            ..
        } => {
            let _ = writeln!(msg, "OPTION                  | FUTURE");
            let _ = writeln!(msg, "------------------------+------------------------");
            let _ = writeln!(
                msg,
                "Strike : {:<15}| Price  : {:.2}",
                format!("{strike} {option_type}"),
                alert.underlying_price
            );
            let _ = writeln!(
                msg,
                "Premium: {:<15}| Change : {:+.2} ({:+.2}%)",
                format!("${option_price:.2}"),
                alert.price_change,
                alert.price_pct
            );
            let _ = writeln!(
                msg,
                "ΔOI    : {} ({} lots)",
                group_thousands(alert.oi_change, true),
                group_thousands(alert.lots as i64, false)
            );
            let _ = writeln!(msg, "OI %   : {:+.1}%", alert.oi_pct);
            let _ = writeln!(msg, "Level  : {}", alert.level);
            let _ = writeln!(msg, "IV ROC : {iv_roc:+.1}%");
            let _ = writeln!(msg, "Type   : {moneyness}");
            let _ = writeln!(msg, "Reading: {activity}");
        }
        AlertLeg::Future { .. } => {
            let _ = writeln!(
                msg,
                "Futures lots buildup: {} ({})",
                group_thousands(alert.lots as i64, false),
                alert.level
            );
            let _ = writeln!(msg, "ΔOI       : {}", group_thousands(alert.oi_change, true));
            let _ = writeln!(msg, "Price     : {:.2}", alert.underlying_price);
            let _ = writeln!(msg, "Price move: {:+.2} ({:+.2}%)", alert.price_change, alert.price_pct);
        }
    }

    let _ = write!(msg, "</pre>\n<b>Time:</b> {time}");
    msg
}

/// Short status body for a failed cycle.
pub fn render_cycle_error(error: &str, at_ns: u64, utc_offset_minutes: i32) -> String {
    format!(
        "<b>Monitor error</b>\n<pre>{}</pre>\n<b>Time:</b> {}",
        escape_html(error),
        format_time(at_ns, utc_offset_minutes)
    )
}

fn format_time(at_ns: u64, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60)).unwrap_or(Utc.fix());
    let utc = DateTime::<Utc>::from_timestamp_nanos(at_ns as i64);
    utc.with_timezone(&offset).format("%H:%M:%S (UTC%:z)").to_string()
}

/// `1234567` → `1,234,567`; with `signed`, positives get a leading `+`.
pub fn group_thousands(n: i64, signed: bool) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    } else if signed && n > 0 {
        out.push('+');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
