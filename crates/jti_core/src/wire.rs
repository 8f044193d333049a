//! Esquema protobuf (GPB) do Juniper Telemetry Interface.
//!
//! Structs escritas à mão com `#[derive(prost::Message)]`, equivalentes ao
//! que o `prost-build` geraria a partir de `telemetry_top.proto`,
//! `optics.proto` e `port.proto` (proto2). Assim não há dependência de
//! `protoc` no build.
//!
//! As extensões proto2 chegam no fio como campos comuns, com o número da
//! extensão como tag:
//!
//! ```text
//! TelemetryStream
//! └── enterprise (101): EnterpriseSensors
//!     └── juniperNetworks (2636): JuniperNetworksSensors
//!         ├── jnpr_interface_ext (3):  Port
//!         └── jnpr_optics_ext    (10): Optics
//! ```
//!
//! Todos os campos são `optional`: ausência decodifica para o valor zero do
//! tipo e nunca gera erro por si só.

use prost::Message;

// ──────────────────────────────────────────────
// Envelope (telemetry_top.proto)
// ──────────────────────────────────────────────

/// Mensagem de topo enviada pelo equipamento em cada datagrama.
#[derive(Clone, PartialEq, Message)]
pub struct TelemetryStream {
    #[prost(string, optional, tag = "1")]
    pub system_id: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub component_id: Option<u32>,
    #[prost(uint32, optional, tag = "3")]
    pub sub_component_id: Option<u32>,
    #[prost(string, optional, tag = "4")]
    pub sensor_name: Option<String>,
    #[prost(uint32, optional, tag = "5")]
    pub sequence_number: Option<u32>,
    /// Milissegundos desde a epoch.
    #[prost(uint64, optional, tag = "6")]
    pub timestamp: Option<u64>,
    #[prost(uint32, optional, tag = "7")]
    pub version_major: Option<u32>,
    #[prost(uint32, optional, tag = "8")]
    pub version_minor: Option<u32>,
    #[prost(message, optional, tag = "101")]
    pub enterprise: Option<EnterpriseSensors>,
}

/// Container de extensões de fabricantes.
#[derive(Clone, PartialEq, Message)]
pub struct EnterpriseSensors {
    /// Extensão `juniperNetworks` (número IANA da Juniper).
    #[prost(message, optional, tag = "2636")]
    pub juniper_networks: Option<JuniperNetworksSensors>,
}

/// Container das extensões específicas da Juniper.
#[derive(Clone, PartialEq, Message)]
pub struct JuniperNetworksSensors {
    #[prost(message, optional, tag = "3")]
    pub jnpr_interface_ext: Option<Port>,
    #[prost(message, optional, tag = "10")]
    pub jnpr_optics_ext: Option<Optics>,
}

// ──────────────────────────────────────────────
// Optics (optics.proto)
// ──────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Optics {
    #[prost(message, repeated, tag = "1")]
    pub optics_diag: Vec<OpticsInfos>,
}

/// Diagnóstico de um transceiver óptico.
#[derive(Clone, PartialEq, Message)]
pub struct OpticsInfos {
    #[prost(string, optional, tag = "1")]
    pub if_name: Option<String>,
    #[prost(uint32, optional, tag = "2")]
    pub snmp_if_index: Option<u32>,
    #[prost(message, optional, tag = "3")]
    pub optics_diag_stats: Option<OpticsDiagStats>,
}

#[derive(Clone, PartialEq, Message)]
pub struct OpticsDiagStats {
    #[prost(uint32, optional, tag = "1")]
    pub optics_type: Option<u32>,
    #[prost(double, optional, tag = "2")]
    pub module_temp: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub module_temp_high_alarm_threshold: Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub module_temp_low_alarm_threshold: Option<f64>,
    #[prost(double, optional, tag = "5")]
    pub module_temp_high_warning_threshold: Option<f64>,
    #[prost(double, optional, tag = "6")]
    pub module_temp_low_warning_threshold: Option<f64>,
    #[prost(double, optional, tag = "7")]
    pub laser_output_power_high_alarm_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "8")]
    pub laser_output_power_low_alarm_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "9")]
    pub laser_output_power_high_warning_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "10")]
    pub laser_output_power_low_warning_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "11")]
    pub laser_rx_power_high_alarm_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "12")]
    pub laser_rx_power_low_alarm_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "13")]
    pub laser_rx_power_high_warning_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "14")]
    pub laser_rx_power_low_warning_threshold_dbm: Option<f64>,
    #[prost(double, optional, tag = "15")]
    pub laser_bias_current_high_alarm_threshold: Option<f64>,
    #[prost(double, optional, tag = "16")]
    pub laser_bias_current_low_alarm_threshold: Option<f64>,
    #[prost(double, optional, tag = "17")]
    pub laser_bias_current_high_warning_threshold: Option<f64>,
    #[prost(double, optional, tag = "18")]
    pub laser_bias_current_low_warning_threshold: Option<f64>,
    #[prost(bool, optional, tag = "19")]
    pub module_temp_high_alarm: Option<bool>,
    #[prost(bool, optional, tag = "20")]
    pub module_temp_low_alarm: Option<bool>,
    #[prost(bool, optional, tag = "21")]
    pub module_temp_high_warning: Option<bool>,
    #[prost(bool, optional, tag = "22")]
    pub module_temp_low_warning: Option<bool>,
    #[prost(message, repeated, tag = "23")]
    pub optics_lane_diag_stats: Vec<OpticsDiagLaneStats>,
}

/// Estatísticas por lane de um transceiver multi-lane (ex: QSFP).
#[derive(Clone, PartialEq, Message)]
pub struct OpticsDiagLaneStats {
    #[prost(uint32, optional, tag = "1")]
    pub lane_number: Option<u32>,
    #[prost(double, optional, tag = "2")]
    pub lane_laser_temperature: Option<f64>,
    #[prost(double, optional, tag = "3")]
    pub lane_laser_output_power_dbm: Option<f64>,
    #[prost(double, optional, tag = "4")]
    pub lane_laser_receiver_power_dbm: Option<f64>,
    #[prost(double, optional, tag = "5")]
    pub lane_laser_bias_current: Option<f64>,
    #[prost(bool, optional, tag = "6")]
    pub lane_laser_output_power_high_alarm: Option<bool>,
    #[prost(bool, optional, tag = "7")]
    pub lane_laser_output_power_low_alarm: Option<bool>,
    #[prost(bool, optional, tag = "8")]
    pub lane_laser_output_power_high_warning: Option<bool>,
    #[prost(bool, optional, tag = "9")]
    pub lane_laser_output_power_low_warning: Option<bool>,
    #[prost(bool, optional, tag = "10")]
    pub lane_laser_receiver_power_high_alarm: Option<bool>,
    #[prost(bool, optional, tag = "11")]
    pub lane_laser_receiver_power_low_alarm: Option<bool>,
    #[prost(bool, optional, tag = "12")]
    pub lane_laser_receiver_power_high_warning: Option<bool>,
    #[prost(bool, optional, tag = "13")]
    pub lane_laser_receiver_power_low_warning: Option<bool>,
    #[prost(bool, optional, tag = "14")]
    pub lane_laser_bias_current_high_alarm: Option<bool>,
    #[prost(bool, optional, tag = "15")]
    pub lane_laser_bias_current_low_alarm: Option<bool>,
    #[prost(bool, optional, tag = "16")]
    pub lane_laser_bias_current_high_warning: Option<bool>,
    #[prost(bool, optional, tag = "17")]
    pub lane_laser_bias_current_low_warning: Option<bool>,
    #[prost(bool, optional, tag = "18")]
    pub lane_tx_loss_of_signal_alarm: Option<bool>,
    #[prost(bool, optional, tag = "19")]
    pub lane_rx_loss_of_signal_alarm: Option<bool>,
    #[prost(bool, optional, tag = "20")]
    pub lane_tx_laser_disabled_alarm: Option<bool>,
}

// ──────────────────────────────────────────────
// Port (port.proto)
// ──────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Port {
    #[prost(message, repeated, tag = "1")]
    pub interface_stats: Vec<InterfaceInfos>,
}

/// Estatísticas de uma interface física ou agregada.
#[derive(Clone, PartialEq, Message)]
pub struct InterfaceInfos {
    #[prost(string, optional, tag = "1")]
    pub if_name: Option<String>,
    #[prost(uint64, optional, tag = "2")]
    pub init_time: Option<u64>,
    #[prost(uint32, optional, tag = "3")]
    pub snmp_if_index: Option<u32>,
    #[prost(string, optional, tag = "4")]
    pub parent_ae_name: Option<String>,
    #[prost(message, repeated, tag = "5")]
    pub egress_queue_info: Vec<QueueStats>,
    #[prost(message, repeated, tag = "6")]
    pub ingress_queue_info: Vec<QueueStats>,
    #[prost(message, optional, tag = "7")]
    pub ingress_stats: Option<InterfaceStats>,
    #[prost(message, optional, tag = "8")]
    pub egress_stats: Option<InterfaceStats>,
    #[prost(message, optional, tag = "9")]
    pub ingress_errors: Option<IngressInterfaceErrors>,
    #[prost(string, optional, tag = "10")]
    pub if_administration_status: Option<String>,
    #[prost(string, optional, tag = "11")]
    pub if_operational_status: Option<String>,
    #[prost(string, optional, tag = "12")]
    pub if_description: Option<String>,
    #[prost(uint64, optional, tag = "13")]
    pub if_transitions: Option<u64>,
    #[prost(uint32, optional, tag = "14")]
    pub if_last_change: Option<u32>,
    #[prost(uint32, optional, tag = "15")]
    pub if_high_speed: Option<u32>,
    #[prost(message, optional, tag = "16")]
    pub egress_errors: Option<EgressInterfaceErrors>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueueStats {
    #[prost(uint32, optional, tag = "1")]
    pub queue_number: Option<u32>,
    #[prost(uint64, optional, tag = "2")]
    pub packets: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub bytes: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub tail_drop_packets: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub rl_drop_packets: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub rl_drop_bytes: Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub red_drop_packets: Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub red_drop_bytes: Option<u64>,
    #[prost(uint64, optional, tag = "9")]
    pub avg_buffer_occupancy: Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub cur_buffer_occupancy: Option<u64>,
    #[prost(uint64, optional, tag = "11")]
    pub peak_buffer_occupancy: Option<u64>,
    #[prost(uint64, optional, tag = "12")]
    pub allocated_buffer_size: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct InterfaceStats {
    #[prost(uint64, optional, tag = "1")]
    pub if_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub if_octets: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub if_1sec_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub if_1sec_octets: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub if_uc_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub if_mc_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub if_bc_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub if_error: Option<u64>,
    #[prost(uint64, optional, tag = "9")]
    pub if_pause_pkts: Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub if_unknown_proto_pkts: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct IngressInterfaceErrors {
    #[prost(uint64, optional, tag = "1")]
    pub if_errors: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub if_in_qdrops: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub if_in_frame_errors: Option<u64>,
    #[prost(uint64, optional, tag = "4")]
    pub if_discards: Option<u64>,
    #[prost(uint64, optional, tag = "5")]
    pub if_in_runts: Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub if_in_l3_incompletes: Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub if_in_l2chan_errors: Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub if_in_l2_mismatch_timeouts: Option<u64>,
    #[prost(uint64, optional, tag = "9")]
    pub if_in_fifo_errors: Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub if_in_resource_errors: Option<u64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EgressInterfaceErrors {
    #[prost(uint64, optional, tag = "1")]
    pub if_errors: Option<u64>,
    #[prost(uint64, optional, tag = "2")]
    pub if_discards: Option<u64>,
}

// ──────────────────────────────────────────────
// Helpers de construção (emitter e testes)
// ──────────────────────────────────────────────

/// Cabeçalho compartilhado de um envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamHeader {
    pub system_id: String,
    pub component_id: u32,
    pub sub_component_id: u32,
    pub sensor_name: String,
    pub sequence_number: u32,
    pub timestamp_ms: u64,
}

impl StreamHeader {
    fn into_stream(self, jnpr: JuniperNetworksSensors) -> TelemetryStream {
        TelemetryStream {
            system_id: Some(self.system_id),
            component_id: Some(self.component_id),
            sub_component_id: Some(self.sub_component_id),
            sensor_name: Some(self.sensor_name),
            sequence_number: Some(self.sequence_number),
            timestamp: Some(self.timestamp_ms),
            version_major: Some(1),
            version_minor: Some(1),
            enterprise: Some(EnterpriseSensors {
                juniper_networks: Some(jnpr),
            }),
        }
    }
}

/// Monta e codifica um envelope carregando a extensão Optics.
pub fn encode_optics_stream(header: StreamHeader, optics: Optics) -> Vec<u8> {
    header
        .into_stream(JuniperNetworksSensors {
            jnpr_optics_ext: Some(optics),
            ..Default::default()
        })
        .encode_to_vec()
}

/// Monta e codifica um envelope carregando a extensão Port.
pub fn encode_port_stream(header: StreamHeader, port: Port) -> Vec<u8> {
    header
        .into_stream(JuniperNetworksSensors {
            jnpr_interface_ext: Some(port),
            ..Default::default()
        })
        .encode_to_vec()
}
