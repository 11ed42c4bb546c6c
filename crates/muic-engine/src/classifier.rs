//! Cable classifier
//!
//! A priority-ordered decision table over a [`RegisterSnapshot`]. Each rule
//! pairs a pure predicate with an attach outcome and a detach outcome; the
//! first rule whose predicate matches wins. Attach evaluates the table on a
//! fresh read, detach evaluates the same table on the snapshot remembered in
//! the session, so both directions share one priority order.
//!
//! Ordering matters:
//! - USB and CDP win over chargers, since a charging host is still a data port
//! - UART is intercepted by rustproof mode before any switch path write
//! - OTG needs the ADC code as well, to reject a floating ID line
//! - the bare VBUS fallback comes last

use muic_regs::{
    AdcCode, CarkitStatus, Control, DeviceType1, DeviceType2, DeviceType3, RegisterSnapshot,
    SwitchPath,
};

use crate::cable::Cable;
use crate::config::Capabilities;
use crate::effects::SideEffect;
use crate::session::{ModeOverrides, SessionState};

/// Result of running the decision table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decision {
    /// Name of the rule that matched, if any
    pub rule: Option<&'static str>,
    /// Identity to announce (attach) or expected to retract (detach)
    pub cable: Option<Cable>,
    /// Actions for the engine to execute
    pub effects: Vec<SideEffect>,
}

impl Decision {
    fn new(cable: Option<Cable>, effects: Vec<SideEffect>) -> Self {
        Self {
            rule: None,
            cable,
            effects,
        }
    }

    fn cable(cable: Cable) -> Self {
        Self::new(Some(cable), Vec::new())
    }

    fn silent(effects: Vec<SideEffect>) -> Self {
        Self::new(None, effects)
    }
}

/// Inputs every rule outcome may consult
struct RuleContext<'a> {
    snapshot: &'a RegisterSnapshot,
    overrides: ModeOverrides,
    caps: &'a Capabilities,
}

struct Rule {
    name: &'static str,
    matches: fn(&RegisterSnapshot, &Capabilities) -> bool,
    attach: fn(&RuleContext<'_>) -> Decision,
    detach: fn(&RuleContext<'_>) -> Decision,
}

/// The decision table, highest priority first
static RULES: [Rule; 11] = [
    Rule {
        name: "usb",
        matches: is_usb,
        attach: usb,
        detach: usb,
    },
    Rule {
        name: "non-standard",
        matches: is_non_standard,
        attach: usb,
        detach: usb,
    },
    Rule {
        name: "cdp",
        matches: is_cdp,
        attach: cdp,
        detach: cdp,
    },
    Rule {
        name: "uart",
        matches: is_uart,
        attach: uart_attach,
        detach: uart_detach,
    },
    Rule {
        name: "charger",
        matches: is_charger,
        attach: charger,
        detach: charger,
    },
    Rule {
        name: "otg",
        matches: is_otg,
        attach: otg_attach,
        detach: otg_detach,
    },
    Rule {
        name: "desk-dock",
        matches: is_desk_dock,
        attach: desk_dock_attach,
        detach: desk_dock_detach,
    },
    Rule {
        name: "mhl",
        matches: is_mhl,
        attach: mhl_attach,
        detach: mhl_detach,
    },
    Rule {
        name: "jig-uart-on",
        matches: is_jig_uart_on,
        attach: jig_uart_on_attach,
        detach: jig_uart_on_detach,
    },
    Rule {
        name: "audio-dock",
        matches: is_audio_dock,
        attach: audio_dock_attach,
        detach: audio_dock_detach,
    },
    Rule {
        name: "incompatible",
        matches: is_incompatible,
        attach: incompatible,
        detach: incompatible,
    },
];

/// Names of the rules in priority order
pub fn rule_names() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|r| r.name)
}

/// Classify a freshly read snapshot
///
/// Total over all register values: returns at most one identity, or none
/// when no rule matches.
pub fn classify_attach(
    snapshot: &RegisterSnapshot,
    overrides: ModeOverrides,
    caps: &Capabilities,
) -> Decision {
    let ctx = RuleContext {
        snapshot,
        overrides,
        caps,
    };
    match matching_rule(snapshot, caps) {
        Some(rule) => Decision {
            rule: Some(rule.name),
            ..(rule.attach)(&ctx)
        },
        None => Decision::default(),
    }
}

/// Decide what to retract from the remembered session
///
/// Always finishes by restoring the default control register, even when
/// the session is already empty.
pub fn classify_detach(
    session: &SessionState,
    overrides: ModeOverrides,
    caps: &Capabilities,
) -> Decision {
    let snapshot = &session.snapshot;
    let ctx = RuleContext {
        snapshot,
        overrides,
        caps,
    };
    let mut decision = match matching_rule(snapshot, caps) {
        Some(rule) if !snapshot.is_empty() => Decision {
            rule: Some(rule.name),
            ..(rule.detach)(&ctx)
        },
        _ => Decision::default(),
    };
    decision
        .effects
        .push(SideEffect::WriteControl(Control::DEFAULT));
    decision
}

/// Rewrite a fresh read the way the audio dock needs before classifying
///
/// The audio dock is only recognizable from its ADC code; the device type
/// registers carry stale USB bits, so they are replaced by the synthesized
/// audio-dock flag.
pub fn normalize_for_attach(snapshot: RegisterSnapshot, caps: &Capabilities) -> RegisterSnapshot {
    if caps.has_audio_dock && snapshot.adc == AdcCode::AUDIO_DOCK {
        RegisterSnapshot {
            device_type_1: DeviceType1::empty(),
            device_type_2: DeviceType2::AUDIO_DOCK,
            ..snapshot
        }
    } else {
        snapshot
    }
}

/// Close the UART path while leaving VBUS connected
pub fn rustproof_close() -> Vec<SideEffect> {
    vec![
        SideEffect::SetSwitchPath(SwitchPath::OpenWithVbus),
        SideEffect::manual_switching(),
    ]
}

/// Undo [`rustproof_close`] and hand switching back to the chip
pub fn rustproof_release() -> Vec<SideEffect> {
    vec![
        SideEffect::SetManualSwitch2(0x00),
        SideEffect::SetSwitchPath(SwitchPath::AllOpen),
        SideEffect::automatic_switching(),
    ]
}

fn matching_rule(snapshot: &RegisterSnapshot, caps: &Capabilities) -> Option<&'static Rule> {
    RULES.iter().find(|rule| (rule.matches)(snapshot, caps))
}

fn dock_route(path: SwitchPath) -> Vec<SideEffect> {
    vec![
        SideEffect::SetSwitchPath(path),
        SideEffect::manual_switching(),
    ]
}

fn dock_release() -> Vec<SideEffect> {
    vec![SideEffect::UpdateControl {
        set: Control::MANUAL_SW | Control::RAW_DATA,
        clear: Control::empty(),
    }]
}

// -----------------------------------------------------------------------------
// Predicates
// -----------------------------------------------------------------------------

fn is_usb(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_1.contains(DeviceType1::USB)
        || s.device_type_2.intersects(DeviceType2::USB_MASK)
        || s.carkit_status.contains(CarkitStatus::CHARGER1)
}

fn is_non_standard(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_3.contains(DeviceType3::NON_STANDARD)
}

fn is_cdp(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_1.contains(DeviceType1::USB_CHG)
}

fn is_uart(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_1.contains(DeviceType1::UART)
        || s.device_type_2.intersects(DeviceType2::UART_MASK)
}

fn is_charger(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_1.intersects(DeviceType1::CHARGER_MASK)
        || s.device_type_3.intersects(DeviceType3::CHARGER_MASK)
}

fn is_otg(s: &RegisterSnapshot, caps: &Capabilities) -> bool {
    caps.has_otg && s.device_type_1.contains(DeviceType1::USB_OTG) && s.adc == AdcCode::OTG
}

fn is_desk_dock(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_2.contains(DeviceType2::AV) || s.device_type_3.contains(DeviceType3::AV_VBUS)
}

fn is_mhl(s: &RegisterSnapshot, caps: &Capabilities) -> bool {
    caps.has_mhl && s.device_type_3.contains(DeviceType3::MHL)
}

fn is_jig_uart_on(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.device_type_2.contains(DeviceType2::JIG_UART_ON)
}

fn is_audio_dock(s: &RegisterSnapshot, caps: &Capabilities) -> bool {
    caps.has_audio_dock && s.device_type_2.contains(DeviceType2::AUDIO_DOCK)
}

fn is_incompatible(s: &RegisterSnapshot, _: &Capabilities) -> bool {
    s.vbus_valid()
}

// -----------------------------------------------------------------------------
// Outcomes
// -----------------------------------------------------------------------------

fn usb(_: &RuleContext<'_>) -> Decision {
    Decision::cable(Cable::Usb)
}

fn cdp(_: &RuleContext<'_>) -> Decision {
    Decision::cable(Cable::ChargeDownstream)
}

fn jig_uart_off(ctx: &RuleContext<'_>) -> Cable {
    if ctx.snapshot.vbus_valid() {
        Cable::JigUartOffVbus
    } else {
        Cable::JigUartOff
    }
}

fn uart_attach(ctx: &RuleContext<'_>) -> Decision {
    if ctx.overrides.uart_disabled {
        return Decision::silent(rustproof_close());
    }
    Decision::new(
        Some(jig_uart_off(ctx)),
        vec![SideEffect::SetSwitchPath(SwitchPath::Uart)],
    )
}

fn uart_detach(ctx: &RuleContext<'_>) -> Decision {
    if ctx.overrides.uart_disabled {
        return Decision::silent(rustproof_release());
    }
    Decision::cable(jig_uart_off(ctx))
}

fn charger(_: &RuleContext<'_>) -> Decision {
    Decision::cable(Cable::Charger)
}

fn otg_attach(_: &RuleContext<'_>) -> Decision {
    Decision::new(
        Some(Cable::UsbHost),
        vec![
            SideEffect::SetSwitchPath(SwitchPath::DHost),
            SideEffect::SetManualSwitch2(0x00),
            SideEffect::manual_switching(),
        ],
    )
}

fn otg_detach(_: &RuleContext<'_>) -> Decision {
    Decision::new(
        Some(Cable::UsbHost),
        vec![
            SideEffect::SetManualSwitch2(0x00),
            SideEffect::SetSwitchPath(SwitchPath::AllOpen),
            SideEffect::automatic_switching(),
        ],
    )
}

fn desk_dock(ctx: &RuleContext<'_>) -> Cable {
    if ctx.snapshot.vbus_valid() {
        Cable::DeskDockVbus
    } else {
        Cable::DeskDock
    }
}

fn desk_dock_attach(ctx: &RuleContext<'_>) -> Decision {
    Decision::new(Some(desk_dock(ctx)), dock_route(SwitchPath::Audio))
}

fn desk_dock_detach(ctx: &RuleContext<'_>) -> Decision {
    Decision::new(Some(desk_dock(ctx)), dock_release())
}

fn mhl_attach(_: &RuleContext<'_>) -> Decision {
    Decision::new(
        Some(Cable::Mhl),
        vec![
            SideEffect::MaskInterrupts,
            SideEffect::MhlPower(true),
            SideEffect::UnmaskInterrupts,
        ],
    )
}

fn mhl_detach(_: &RuleContext<'_>) -> Decision {
    Decision::new(Some(Cable::Mhl), vec![SideEffect::MhlPower(false)])
}

fn jig_uart_on_attach(ctx: &RuleContext<'_>) -> Decision {
    if ctx.caps.cardock_factory_mode {
        Decision::new(Some(Cable::CarDock), dock_route(SwitchPath::Uart))
    } else if ctx.overrides.uart_disabled {
        Decision::silent(rustproof_close())
    } else {
        Decision::cable(Cable::JigUartOn)
    }
}

fn jig_uart_on_detach(ctx: &RuleContext<'_>) -> Decision {
    if ctx.caps.cardock_factory_mode {
        Decision::new(Some(Cable::CarDock), dock_release())
    } else if ctx.overrides.uart_disabled {
        Decision::silent(rustproof_release())
    } else {
        Decision::cable(Cable::JigUartOn)
    }
}

fn audio_dock_attach(_: &RuleContext<'_>) -> Decision {
    Decision::new(Some(Cable::AudioDock), dock_route(SwitchPath::DHost))
}

fn audio_dock_detach(_: &RuleContext<'_>) -> Decision {
    Decision::new(Some(Cable::AudioDock), dock_release())
}

fn incompatible(_: &RuleContext<'_>) -> Decision {
    Decision::cable(Cable::Incompatible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(dev1: u8, dev2: u8, dev3: u8, carkit: u8, vbus: u8, adc: u8) -> RegisterSnapshot {
        RegisterSnapshot::from_registers(dev1, dev2, dev3, carkit, vbus, adc)
    }

    fn attach(snapshot: RegisterSnapshot) -> Decision {
        classify_attach(&snapshot, ModeOverrides::default(), &Capabilities::default())
    }

    fn rustproof() -> ModeOverrides {
        ModeOverrides {
            uart_disabled: true,
        }
    }

    #[test]
    fn test_usb_beats_dedicated_charger() {
        let decision = attach(snap(0x44, 0, 0, 0, 0x02, 0x1F));
        assert_eq!(decision.cable, Some(Cable::Usb));
        assert_eq!(decision.rule, Some("usb"));
    }

    #[test]
    fn test_carkit_charger_is_usb() {
        assert_eq!(attach(snap(0, 0, 0, 0x02, 0, 0x1F)).cable, Some(Cable::Usb));
    }

    #[test]
    fn test_non_standard_falls_back_to_usb() {
        let decision = attach(snap(0, 0, 0x04, 0, 0x02, 0x1F));
        assert_eq!(decision.cable, Some(Cable::Usb));
        assert_eq!(decision.rule, Some("non-standard"));
    }

    #[test]
    fn test_cdp() {
        assert_eq!(
            attach(snap(0x20, 0, 0, 0, 0x02, 0x1F)).cable,
            Some(Cable::ChargeDownstream)
        );
    }

    #[test]
    fn test_uart_vbus_variants() {
        let with_vbus = attach(snap(0, 0x08, 0, 0, 0x02, 0x1C));
        assert_eq!(with_vbus.cable, Some(Cable::JigUartOffVbus));
        assert_eq!(
            with_vbus.effects,
            vec![SideEffect::SetSwitchPath(SwitchPath::Uart)]
        );

        let without_vbus = attach(snap(0, 0x08, 0, 0, 0x00, 0x1C));
        assert_eq!(without_vbus.cable, Some(Cable::JigUartOff));
    }

    #[test]
    fn test_rustproof_intercepts_uart() {
        let decision = classify_attach(
            &snap(0x08, 0, 0, 0, 0x02, 0x1C),
            rustproof(),
            &Capabilities::default(),
        );
        assert_eq!(decision.cable, None);
        assert_eq!(decision.rule, Some("uart"));
        assert_eq!(decision.effects, rustproof_close());
        assert!(!decision
            .effects
            .contains(&SideEffect::SetSwitchPath(SwitchPath::Uart)));
    }

    #[test]
    fn test_dedicated_and_u200_chargers() {
        assert_eq!(attach(snap(0x40, 0, 0, 0, 0x02, 0x1F)).cable, Some(Cable::Charger));
        assert_eq!(attach(snap(0, 0, 0x40, 0, 0x02, 0x1F)).cable, Some(Cable::Charger));
    }

    #[test]
    fn test_otg_requires_adc_confirmation() {
        let decision = attach(snap(0x80, 0, 0, 0, 0, 0x00));
        assert_eq!(decision.cable, Some(Cable::UsbHost));
        assert_eq!(
            decision.effects[0],
            SideEffect::SetSwitchPath(SwitchPath::DHost)
        );

        assert_eq!(attach(snap(0x80, 0, 0, 0, 0, 0x1F)).cable, None);
    }

    #[test]
    fn test_otg_gated_by_capability() {
        let caps = Capabilities {
            has_otg: false,
            ..Default::default()
        };
        let decision = classify_attach(&snap(0x80, 0, 0, 0, 0, 0x00), ModeOverrides::default(), &caps);
        assert_eq!(decision.cable, None);
    }

    #[test]
    fn test_desk_dock_routes_audio() {
        let decision = attach(snap(0, 0x40, 0, 0, 0x02, 0x1A));
        assert_eq!(decision.cable, Some(Cable::DeskDockVbus));
        assert_eq!(decision.effects, dock_route(SwitchPath::Audio));

        assert_eq!(attach(snap(0, 0, 0x10, 0, 0, 0x1A)).cable, Some(Cable::DeskDock));
    }

    #[test]
    fn test_mhl_brackets_negotiation_with_mask() {
        let caps = Capabilities {
            has_mhl: true,
            ..Default::default()
        };
        let decision = classify_attach(&snap(0, 0, 0x01, 0, 0x02, 0x01), ModeOverrides::default(), &caps);
        assert_eq!(decision.cable, Some(Cable::Mhl));
        assert_eq!(
            decision.effects,
            vec![
                SideEffect::MaskInterrupts,
                SideEffect::MhlPower(true),
                SideEffect::UnmaskInterrupts
            ]
        );

        // Without the bridge, MHL falls through to the VBUS fallback
        assert_eq!(
            attach(snap(0, 0, 0x01, 0, 0x02, 0x01)).cable,
            Some(Cable::Incompatible)
        );
    }

    #[test]
    fn test_jig_uart_on_variants() {
        let s = snap(0, 0x04, 0, 0, 0, 0x1D);
        assert_eq!(attach(s).cable, Some(Cable::JigUartOn));

        let closed = classify_attach(&s, rustproof(), &Capabilities::default());
        assert_eq!(closed.cable, None);
        assert_eq!(closed.effects, rustproof_close());

        let factory = Capabilities {
            cardock_factory_mode: true,
            ..Default::default()
        };
        let dock = classify_attach(&s, rustproof(), &factory);
        assert_eq!(dock.cable, Some(Cable::CarDock));
        assert_eq!(dock.effects, dock_route(SwitchPath::Uart));
    }

    #[test]
    fn test_audio_dock_normalization() {
        let caps = Capabilities::default();
        let raw = snap(0x04, 0x00, 0, 0, 0x02, 0x12);
        let normalized = normalize_for_attach(raw, &caps);
        assert!(normalized.device_type_1.is_empty());

        let decision = classify_attach(&normalized, ModeOverrides::default(), &caps);
        assert_eq!(decision.cable, Some(Cable::AudioDock));
        assert_eq!(decision.effects, dock_route(SwitchPath::DHost));

        let without = Capabilities {
            has_audio_dock: false,
            ..Default::default()
        };
        assert_eq!(normalize_for_attach(raw, &without), raw);
    }

    #[test]
    fn test_vbus_fallback_and_none() {
        assert_eq!(
            attach(snap(0, 0, 0, 0, 0x02, 0x1F)).cable,
            Some(Cable::Incompatible)
        );

        let nothing = attach(snap(0, 0, 0, 0, 0, 0x1F));
        assert_eq!(nothing, Decision::default());
    }

    #[test]
    fn test_detach_uses_remembered_snapshot() {
        let session = SessionState {
            cable: Some(Cable::DeskDockVbus),
            snapshot: snap(0, 0x40, 0, 0, 0x02, 0x1A),
            ..Default::default()
        };
        let decision = classify_detach(&session, ModeOverrides::default(), &Capabilities::default());
        assert_eq!(decision.cable, Some(Cable::DeskDockVbus));
        assert_eq!(
            decision.effects,
            vec![
                SideEffect::UpdateControl {
                    set: Control::MANUAL_SW | Control::RAW_DATA,
                    clear: Control::empty()
                },
                SideEffect::WriteControl(Control::DEFAULT),
            ]
        );
    }

    #[test]
    fn test_detach_of_empty_session_restores_control() {
        let decision = classify_detach(
            &SessionState::default(),
            ModeOverrides::default(),
            &Capabilities::default(),
        );
        assert_eq!(decision.cable, None);
        assert_eq!(
            decision.effects,
            vec![SideEffect::WriteControl(Control::DEFAULT)]
        );
    }

    #[test]
    fn test_rustproof_detach_releases_path() {
        let session = SessionState {
            snapshot: snap(0x08, 0, 0, 0, 0, 0x1C),
            ..Default::default()
        };
        let decision = classify_detach(&session, rustproof(), &Capabilities::default());
        assert_eq!(decision.cable, None);
        assert_eq!(&decision.effects[..3], &rustproof_release()[..]);
    }

    #[test]
    fn test_rule_order() {
        let names: Vec<_> = rule_names().collect();
        assert_eq!(names.first(), Some(&"usb"));
        assert_eq!(names.last(), Some(&"incompatible"));
        assert_eq!(names.len(), 11);
    }
}
