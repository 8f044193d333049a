//! Extrator da família Port (contadores de interface).
//!
//! Cada `InterfaceInfos` vira um dispositivo `interface` com 39 leituras de
//! interface, seguidas de 11 leituras por fila de ingress e depois 11 por
//! fila de egress.

use crate::extract::{ExtractionError, SensorExtractor, interface_descriptor};
use crate::types::{DecodedRecord, OutputKind, Reading, SensorContext};
use crate::wire::{
    EgressInterfaceErrors, IngressInterfaceErrors, InterfaceInfos, InterfaceStats, Port,
    QueueStats,
};

/// Leituras de interface por bloco.
pub const INTERFACE_READINGS: usize = 39;

/// Leituras por fila.
pub const QUEUE_READINGS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortExtractor;

impl SensorExtractor for PortExtractor {
    type Payload = Port;
    type Block = InterfaceInfos;

    fn family(&self) -> &'static str {
        "port"
    }

    fn blocks<'a>(&self, payload: &'a Port) -> &'a [InterfaceInfos] {
        &payload.interface_stats
    }

    fn extract_block(
        &self,
        ctx: &SensorContext,
        iface: &InterfaceInfos,
    ) -> Result<DecodedRecord, ExtractionError> {
        let mut descriptor = interface_descriptor(self.family(), ctx, iface.if_name.as_deref())?;
        if let Some(parent) = iface.parent_ae_name.as_deref().filter(|p| !p.is_empty()) {
            descriptor
                .context
                .insert("parent_ae_name".to_string(), parent.to_string());
        }

        Ok(DecodedRecord {
            descriptor,
            readings: port_readings(iface),
        })
    }
}

/// Leituras de um bloco: interface, filas de ingress, filas de egress.
pub fn port_readings(iface: &InterfaceInfos) -> Vec<Reading> {
    let mut readings = interface_readings(iface);
    readings.reserve(
        (iface.ingress_queue_info.len() + iface.egress_queue_info.len()) * QUEUE_READINGS,
    );
    for q in &iface.ingress_queue_info {
        readings.extend(queue_readings(q, Direction::Ingress));
    }
    for q in &iface.egress_queue_info {
        readings.extend(queue_readings(q, Direction::Egress));
    }
    readings
}

fn interface_readings(iface: &InterfaceInfos) -> Vec<Reading> {
    use OutputKind::{
        BytesCounter, BytesPerSecond, MegabitPerSecond, Number, PacketsPerSecond, Status,
        TimeTicks, Timestamp,
    };

    let ins = iface.ingress_stats.clone().unwrap_or_default();
    let out = iface.egress_stats.clone().unwrap_or_default();
    let in_err = iface.ingress_errors.clone().unwrap_or_default();
    let out_err = iface.egress_errors.clone().unwrap_or_default();

    let n = |v: Option<u64>| v.unwrap_or_default();
    let text = |v: &Option<String>| v.as_deref().unwrap_or_default().to_string();
    let ingress = |r: Reading| r.with("direction", "ingress");
    let egress = |r: Reading| r.with("direction", "egress");

    let mut readings = vec![
        // Bytes
        ingress(BytesCounter.reading("if_octets", n(ins.if_octets))),
        egress(BytesCounter.reading("if_octets", n(out.if_octets))),
        // Bytes por segundo
        ingress(BytesPerSecond.reading("if_1sec_octets", n(ins.if_1sec_octets))),
        egress(BytesPerSecond.reading("if_1sec_octets", n(out.if_1sec_octets))),
        // Velocidade
        MegabitPerSecond.reading("if_high_speed", iface.if_high_speed.unwrap_or_default()),
        // Erros sem unidade
        ingress(Number.reading("if_in_fifo_errors", n(in_err.if_in_fifo_errors))),
        ingress(Number.reading("if_in_resource_errors", n(in_err.if_in_resource_errors))),
    ];

    // Pacotes por direção
    readings.extend(packet_counters(&ins).into_iter().map(ingress));
    readings.extend(packet_counters(&out).into_iter().map(egress));

    readings.extend(egress_errors(&out_err).into_iter().map(egress));
    readings.extend(ingress_errors(&in_err).into_iter().map(ingress));

    readings.extend([
        // Pacotes por segundo
        ingress(PacketsPerSecond.reading("if_1sec_pkts", n(ins.if_1sec_pkts))),
        egress(PacketsPerSecond.reading("if_1sec_pkts", n(out.if_1sec_pkts))),
        // Tempo
        Timestamp.reading("init_time", n(iface.init_time)),
        TimeTicks.reading("if_last_change", iface.if_last_change.unwrap_or_default()),
        // Status
        Status.reading("if_administration_status", text(&iface.if_administration_status).as_str()),
        Status.reading("if_operational_status", text(&iface.if_operational_status).as_str()),
        // Strings
        OutputKind::String.reading("if_description", text(&iface.if_description).as_str()),
        OutputKind::String.reading("parent_ae_name", text(&iface.parent_ae_name).as_str()),
    ]);

    readings
}

fn packet_counters(s: &InterfaceStats) -> [Reading; 7] {
    let c = OutputKind::PacketsCounter;
    let n = |v: Option<u64>| v.unwrap_or_default();
    [
        c.reading("if_pkts", n(s.if_pkts)),
        c.reading("if_uc_pkts", n(s.if_uc_pkts)),
        c.reading("if_mc_pkts", n(s.if_mc_pkts)),
        c.reading("if_bc_pkts", n(s.if_bc_pkts)),
        c.reading("if_error", n(s.if_error)),
        c.reading("if_pause_pkts", n(s.if_pause_pkts)),
        c.reading("if_unknown_proto_pkts", n(s.if_unknown_proto_pkts)),
    ]
}

fn egress_errors(e: &EgressInterfaceErrors) -> [Reading; 2] {
    let c = OutputKind::PacketsCounter;
    [
        c.reading("if_errors", e.if_errors.unwrap_or_default()),
        c.reading("if_discards", e.if_discards.unwrap_or_default()),
    ]
}

fn ingress_errors(e: &IngressInterfaceErrors) -> [Reading; 8] {
    let c = OutputKind::PacketsCounter;
    let n = |v: Option<u64>| v.unwrap_or_default();
    [
        c.reading("if_errors", n(e.if_errors)),
        c.reading("if_in_qdrops", n(e.if_in_qdrops)),
        c.reading("if_in_frame_errors", n(e.if_in_frame_errors)),
        c.reading("if_discards", n(e.if_discards)),
        c.reading("if_in_runts", n(e.if_in_runts)),
        c.reading("if_in_l3_incompletes", n(e.if_in_l3_incompletes)),
        c.reading("if_in_l2chan_errors", n(e.if_in_l2chan_errors)),
        c.reading("if_in_l2_mismatch_timeouts", n(e.if_in_l2_mismatch_timeouts)),
    ]
}

fn queue_readings(q: &QueueStats, direction: Direction) -> Vec<Reading> {
    use OutputKind::{BytesCounter, Number, PacketsCounter};

    let queue = q.queue_number.unwrap_or_default().to_string();
    let n = |v: Option<u64>| v.unwrap_or_default();

    [
        PacketsCounter.reading("packets", n(q.packets)),
        PacketsCounter.reading("tail_drop_packets", n(q.tail_drop_packets)),
        PacketsCounter.reading("rl_drop_packets", n(q.rl_drop_packets)),
        PacketsCounter.reading("red_drop_packets", n(q.red_drop_packets)),
        PacketsCounter.reading("avg_buffer_occupancy", n(q.avg_buffer_occupancy)),
        PacketsCounter.reading("cur_buffer_occupancy", n(q.cur_buffer_occupancy)),
        PacketsCounter.reading("peak_buffer_occupancy", n(q.peak_buffer_occupancy)),
        BytesCounter.reading("bytes", n(q.bytes)),
        BytesCounter.reading("rl_drop_bytes", n(q.rl_drop_bytes)),
        BytesCounter.reading("red_drop_bytes", n(q.red_drop_bytes)),
        Number.reading("allocated_buffer_size", n(q.allocated_buffer_size)),
    ]
    .into_iter()
    .map(|r| {
        r.with("queue_number", queue.clone())
            .with("direction", direction.as_str())
    })
    .collect()
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
