//! Console output for engine events

use muic_engine::{Cable, MuicEvent, MuicStatus, PassReport};

fn cable_list(cables: &[Cable]) -> String {
    cables
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_report(report: &PassReport) -> String {
    let mut line = format!("pass {:?}/{:?}", report.trigger, report.action);
    if !report.retracted.is_empty() {
        line.push_str(&format!(" -[{}]", cable_list(&report.retracted)));
    }
    if !report.announced.is_empty() {
        line.push_str(&format!(" +[{}]", cable_list(&report.announced)));
    }
    line
}

/// One console line per event
pub fn describe_event(event: &MuicEvent) -> String {
    match event {
        MuicEvent::CableAttached { cable } => format!("attached  {}", cable),
        MuicEvent::CableDetached { cable } => format!("detached  {}", cable),
        MuicEvent::PassCompleted { report } => describe_report(report),
        MuicEvent::UartModeChanged { uart_enabled } => {
            format!("uart      {}", if *uart_enabled { "enabled" } else { "disabled" })
        }
        MuicEvent::ResetDone => "reset     done".to_string(),
        MuicEvent::Error { source, message } => format!("error     {}: {}", source, message),
    }
}

pub fn describe_status(status: &MuicStatus) -> String {
    format!(
        "status    cable={} uart={} jig={} path={}",
        status.cable().map_or("none", |c| c.name()),
        if status.uart_enabled() { "on" } else { "off" },
        if status.session.jig_present { "on" } else { "off" },
        status.manual_path.map_or("-", |p| p.name()),
    )
}
