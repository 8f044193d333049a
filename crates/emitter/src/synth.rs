//! Gerador de envelopes JTI sintéticos.
//!
//! Os valores evoluem a cada ciclo (contadores crescem, potências oscilam)
//! para que o collector tenha algo vivo para mostrar.

use jti_core::config::EmitterConfig;
use jti_core::wire::{
    EgressInterfaceErrors, IngressInterfaceErrors, InterfaceInfos, InterfaceStats, Optics,
    OpticsDiagLaneStats, OpticsDiagStats, OpticsInfos, Port, QueueStats, StreamHeader,
    encode_optics_stream, encode_port_stream,
};
use std::time::{SystemTime, UNIX_EPOCH};

pub const OPTICS_SENSOR: &str = "jti-optics:/junos/system/linecard/optics/";
pub const PORT_SENSOR: &str = "jti-port:/junos/system/linecard/interface/";

/// Velocidade anunciada das interfaces (Mbps).
const HIGH_SPEED_MBPS: u32 = 100_000;

/// Estado do gerador.
pub struct StreamSynth {
    system_id: String,
    interfaces: Vec<String>,
    lanes: u32,
    queues: u32,
    sequence: u32,
    cycle: u64,
    init_time: u64,
}

impl StreamSynth {
    pub fn new(config: &EmitterConfig) -> Self {
        Self {
            system_id: config.system_id.clone(),
            interfaces: config.interfaces.clone(),
            lanes: config.lanes,
            queues: config.queues,
            sequence: 0,
            cycle: 0,
            init_time: now_ms() / 1000,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Gera os dois datagramas do ciclo (Optics, Port) e avança o estado.
    pub fn next_cycle(&mut self) -> (Vec<u8>, Vec<u8>) {
        self.cycle += 1;
        let optics = encode_optics_stream(self.header(OPTICS_SENSOR), self.optics());
        let port = encode_port_stream(self.header(PORT_SENSOR), self.port());
        (optics, port)
    }

    fn header(&mut self, sensor: &str) -> StreamHeader {
        self.sequence = self.sequence.wrapping_add(1);
        StreamHeader {
            system_id: self.system_id.clone(),
            component_id: 0,
            sub_component_id: 0,
            sensor_name: sensor.to_string(),
            sequence_number: self.sequence,
            timestamp_ms: now_ms(),
        }
    }

    /// Oscilação suave em torno de `base`, defasada por interface/lane.
    fn wave(&self, base: f64, amplitude: f64, phase: usize) -> f64 {
        let t = self.cycle as f64 / 10.0 + phase as f64;
        base + amplitude * t.sin()
    }

    fn optics(&self) -> Optics {
        let optics_diag = self
            .interfaces
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let lanes = (0..self.lanes)
                    .map(|lane| {
                        let phase = i * 8 + lane as usize;
                        let rx = self.wave(-2.5, 0.8, phase);
                        OpticsDiagLaneStats {
                            lane_number: Some(lane),
                            lane_laser_temperature: Some(self.wave(42.0, 1.5, phase)),
                            lane_laser_output_power_dbm: Some(self.wave(0.5, 0.3, phase)),
                            lane_laser_receiver_power_dbm: Some(rx),
                            lane_laser_bias_current: Some(self.wave(38.0, 2.0, phase)),
                            lane_laser_receiver_power_low_warning: Some(rx < -3.0),
                            lane_rx_loss_of_signal_alarm: Some(false),
                            ..Default::default()
                        }
                    })
                    .collect();

                let temp = self.wave(38.0, 2.0, i);
                OpticsInfos {
                    if_name: Some(name.clone()),
                    snmp_if_index: Some(500 + i as u32),
                    optics_diag_stats: Some(OpticsDiagStats {
                        optics_type: Some(1),
                        module_temp: Some(temp),
                        module_temp_high_alarm_threshold: Some(75.0),
                        module_temp_low_alarm_threshold: Some(-5.0),
                        module_temp_high_warning_threshold: Some(70.0),
                        module_temp_low_warning_threshold: Some(0.0),
                        laser_output_power_high_alarm_threshold_dbm: Some(4.0),
                        laser_output_power_low_alarm_threshold_dbm: Some(-8.0),
                        laser_output_power_high_warning_threshold_dbm: Some(3.0),
                        laser_output_power_low_warning_threshold_dbm: Some(-7.0),
                        laser_rx_power_high_alarm_threshold_dbm: Some(4.0),
                        laser_rx_power_low_alarm_threshold_dbm: Some(-12.0),
                        laser_rx_power_high_warning_threshold_dbm: Some(3.0),
                        laser_rx_power_low_warning_threshold_dbm: Some(-10.0),
                        laser_bias_current_high_alarm_threshold: Some(75.0),
                        laser_bias_current_low_alarm_threshold: Some(10.0),
                        laser_bias_current_high_warning_threshold: Some(70.0),
                        laser_bias_current_low_warning_threshold: Some(15.0),
                        module_temp_high_alarm: Some(temp > 75.0),
                        module_temp_high_warning: Some(temp > 70.0),
                        optics_lane_diag_stats: lanes,
                        ..Default::default()
                    }),
                }
            })
            .collect();

        Optics { optics_diag }
    }

    fn port(&self) -> Port {
        let c = self.cycle;
        let interface_stats = self
            .interfaces
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let rate = 1_000 + 250 * i as u64;
                let stats = |scale: u64| InterfaceStats {
                    if_pkts: Some(c * rate * scale),
                    if_octets: Some(c * rate * scale * 512),
                    if_1sec_pkts: Some(rate * scale),
                    if_1sec_octets: Some(rate * scale * 512),
                    if_uc_pkts: Some(c * rate * scale - c),
                    if_mc_pkts: Some(c),
                    if_bc_pkts: Some(0),
                    if_error: Some(0),
                    if_pause_pkts: Some(0),
                    if_unknown_proto_pkts: Some(0),
                };
                let queues = |scale: u64| -> Vec<QueueStats> {
                    (0..self.queues)
                        .map(|q| QueueStats {
                            queue_number: Some(q),
                            packets: Some(c * rate * scale / (q as u64 + 1)),
                            bytes: Some(c * rate * scale * 512 / (q as u64 + 1)),
                            allocated_buffer_size: Some(1 << 20),
                            cur_buffer_occupancy: Some((c * 37 + q as u64 * 101) % 4096),
                            ..Default::default()
                        })
                        .collect()
                };

                InterfaceInfos {
                    if_name: Some(name.clone()),
                    init_time: Some(self.init_time),
                    snmp_if_index: Some(500 + i as u32),
                    ingress_stats: Some(stats(1)),
                    egress_stats: Some(stats(2)),
                    ingress_queue_info: queues(1),
                    egress_queue_info: queues(2),
                    ingress_errors: Some(IngressInterfaceErrors {
                        if_errors: Some(c / 100),
                        if_in_qdrops: Some(0),
                        if_discards: Some(c / 50),
                        ..Default::default()
                    }),
                    egress_errors: Some(EgressInterfaceErrors {
                        if_errors: Some(0),
                        if_discards: Some(c / 80),
                    }),
                    if_administration_status: Some("UP".into()),
                    if_operational_status: Some("UP".into()),
                    if_description: Some(format!("synthetic uplink {i}")),
                    if_transitions: Some(1),
                    if_last_change: Some(0),
                    if_high_speed: Some(HIGH_SPEED_MBPS),
                    ..Default::default()
                }
            })
            .collect();

        Port { interface_stats }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jti_core::decoder::JtiDecoder;
    use jti_core::registry::MemoryRegistry;
    use jti_core::types::ReadingValue;
    use std::sync::Arc;

    fn decoder() -> JtiDecoder {
        JtiDecoder::new(Arc::new(MemoryRegistry::new()))
    }

    #[test]
    fn cycle_decodes_to_expected_readings() {
        let config = EmitterConfig::default();
        let mut synth = StreamSynth::new(&config);
        let (optics, port) = synth.next_cycle();
        assert_eq!(synth.cycle(), 1);

        let records = decoder().decode(&optics).unwrap();
        assert_eq!(records.len(), config.interfaces.len());
        assert_eq!(records[0].readings.len(), 22 + 19 * config.lanes as usize);
        assert_eq!(records[0].descriptor.info, "mx960-lab interface et-0/0/0");

        let records = decoder().decode(&port).unwrap();
        assert_eq!(records.len(), config.interfaces.len());
        assert_eq!(
            records[1].readings.len(),
            39 + 11 * 2 * config.queues as usize
        );
    }

    #[test]
    fn counters_grow_between_cycles() {
        let mut synth = StreamSynth::new(&EmitterConfig::default());
        let octets = |bytes: &[u8]| {
            decoder().decode(bytes).unwrap()[0]
                .readings
                .iter()
                .find(|r| r.name == "if_octets" && r.context_value("direction") == Some("ingress"))
                .map(|r| r.value.clone())
        };

        let (_, first) = synth.next_cycle();
        let (_, second) = synth.next_cycle();
        assert_eq!(octets(&first), Some(ReadingValue::Uint(1_000 * 512)));
        assert_eq!(octets(&second), Some(ReadingValue::Uint(2 * 1_000 * 512)));
    }

    #[test]
    fn sequence_numbers_advance() {
        let mut synth = StreamSynth::new(&EmitterConfig::default());
        let h1 = synth.header(OPTICS_SENSOR);
        let h2 = synth.header(PORT_SENSOR);
        assert_eq!(h2.sequence_number, h1.sequence_number + 1);
        assert_eq!(h1.system_id, "mx960-lab");
    }
}
