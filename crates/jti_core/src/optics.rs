//! Extrator da família Optics (diagnóstico de transceivers).
//!
//! Cada `OpticsInfos` vira um dispositivo `interface` com 22 leituras de
//! módulo seguidas de 19 leituras por lane reportada.

use crate::extract::{ExtractionError, SensorExtractor, interface_descriptor};
use crate::types::{DecodedRecord, OutputKind, Reading, SensorContext};
use crate::wire::{Optics, OpticsDiagLaneStats, OpticsDiagStats, OpticsInfos};

/// Leituras de módulo por transceiver.
pub const MODULE_READINGS: usize = 22;

/// Leituras por lane.
pub const LANE_READINGS: usize = 19;

#[derive(Debug, Clone, Copy, Default)]
pub struct OpticsExtractor;

impl SensorExtractor for OpticsExtractor {
    type Payload = Optics;
    type Block = OpticsInfos;

    fn family(&self) -> &'static str {
        "optics"
    }

    fn blocks<'a>(&self, payload: &'a Optics) -> &'a [OpticsInfos] {
        &payload.optics_diag
    }

    fn extract_block(
        &self,
        ctx: &SensorContext,
        info: &OpticsInfos,
    ) -> Result<DecodedRecord, ExtractionError> {
        let descriptor = interface_descriptor(self.family(), ctx, info.if_name.as_deref())?;
        Ok(DecodedRecord {
            descriptor,
            readings: optics_readings(info),
        })
    }
}

/// Leituras de um bloco: módulo primeiro, depois lanes na ordem do fio.
pub fn optics_readings(info: &OpticsInfos) -> Vec<Reading> {
    let stats = info.optics_diag_stats.clone().unwrap_or_default();

    let mut readings = module_readings(&stats);
    readings.reserve(stats.optics_lane_diag_stats.len() * LANE_READINGS);
    for lane in &stats.optics_lane_diag_stats {
        readings.extend(lane_readings(lane));
    }
    readings
}

fn module_readings(s: &OpticsDiagStats) -> Vec<Reading> {
    use OutputKind::{Boolean, DecibelMilliwatts, Milliamperes, Number, Temperature};

    let f = |v: Option<f64>| v.unwrap_or_default();
    let b = |v: Option<bool>| v.unwrap_or_default();

    vec![
        Number.reading("optics_type", s.optics_type.unwrap_or_default()),
        // Temperatura do módulo
        Temperature.reading("module_temp", f(s.module_temp)),
        Temperature.reading(
            "module_temp_high_alarm_threshold",
            f(s.module_temp_high_alarm_threshold),
        ),
        Temperature.reading(
            "module_temp_low_alarm_threshold",
            f(s.module_temp_low_alarm_threshold),
        ),
        Temperature.reading(
            "module_temp_high_warning_threshold",
            f(s.module_temp_high_warning_threshold),
        ),
        Temperature.reading(
            "module_temp_low_warning_threshold",
            f(s.module_temp_low_warning_threshold),
        ),
        // Potência de saída
        DecibelMilliwatts.reading(
            "laser_output_power_high_alarm_threshold_dbm",
            f(s.laser_output_power_high_alarm_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_output_power_low_alarm_threshold_dbm",
            f(s.laser_output_power_low_alarm_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_output_power_high_warning_threshold_dbm",
            f(s.laser_output_power_high_warning_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_output_power_low_warning_threshold_dbm",
            f(s.laser_output_power_low_warning_threshold_dbm),
        ),
        // Potência de recepção
        DecibelMilliwatts.reading(
            "laser_rx_power_high_alarm_threshold_dbm",
            f(s.laser_rx_power_high_alarm_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_rx_power_low_alarm_threshold_dbm",
            f(s.laser_rx_power_low_alarm_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_rx_power_high_warning_threshold_dbm",
            f(s.laser_rx_power_high_warning_threshold_dbm),
        ),
        DecibelMilliwatts.reading(
            "laser_rx_power_low_warning_threshold_dbm",
            f(s.laser_rx_power_low_warning_threshold_dbm),
        ),
        // Corrente de bias
        Milliamperes.reading(
            "laser_bias_current_high_alarm_threshold",
            f(s.laser_bias_current_high_alarm_threshold),
        ),
        Milliamperes.reading(
            "laser_bias_current_low_alarm_threshold",
            f(s.laser_bias_current_low_alarm_threshold),
        ),
        Milliamperes.reading(
            "laser_bias_current_high_warning_threshold",
            f(s.laser_bias_current_high_warning_threshold),
        ),
        Milliamperes.reading(
            "laser_bias_current_low_warning_threshold",
            f(s.laser_bias_current_low_warning_threshold),
        ),
        // Flags
        Boolean.reading("module_temp_high_alarm", b(s.module_temp_high_alarm)),
        Boolean.reading("module_temp_low_alarm", b(s.module_temp_low_alarm)),
        Boolean.reading("module_temp_high_warning", b(s.module_temp_high_warning)),
        Boolean.reading("module_temp_low_warning", b(s.module_temp_low_warning)),
    ]
}

fn lane_readings(l: &OpticsDiagLaneStats) -> Vec<Reading> {
    use OutputKind::{Boolean, DecibelMilliwatts, Milliamperes, Temperature};

    let lane = l.lane_number.unwrap_or_default().to_string();
    let f = |v: Option<f64>| v.unwrap_or_default();
    let b = |v: Option<bool>| v.unwrap_or_default();

    [
        Temperature.reading("lane_laser_temperature", f(l.lane_laser_temperature)),
        DecibelMilliwatts.reading("lane_laser_output_power_dbm", f(l.lane_laser_output_power_dbm)),
        DecibelMilliwatts.reading(
            "lane_laser_receiver_power_dbm",
            f(l.lane_laser_receiver_power_dbm),
        ),
        Milliamperes.reading("lane_laser_bias_current", f(l.lane_laser_bias_current)),
        Boolean.reading(
            "lane_laser_output_power_high_alarm",
            b(l.lane_laser_output_power_high_alarm),
        ),
        Boolean.reading(
            "lane_laser_output_power_low_alarm",
            b(l.lane_laser_output_power_low_alarm),
        ),
        Boolean.reading(
            "lane_laser_output_power_high_warning",
            b(l.lane_laser_output_power_high_warning),
        ),
        Boolean.reading(
            "lane_laser_output_power_low_warning",
            b(l.lane_laser_output_power_low_warning),
        ),
        Boolean.reading(
            "lane_laser_receiver_power_high_alarm",
            b(l.lane_laser_receiver_power_high_alarm),
        ),
        Boolean.reading(
            "lane_laser_receiver_power_low_alarm",
            b(l.lane_laser_receiver_power_low_alarm),
        ),
        Boolean.reading(
            "lane_laser_receiver_power_high_warning",
            b(l.lane_laser_receiver_power_high_warning),
        ),
        Boolean.reading(
            "lane_laser_receiver_power_low_warning",
            b(l.lane_laser_receiver_power_low_warning),
        ),
        Boolean.reading(
            "lane_laser_bias_current_high_alarm",
            b(l.lane_laser_bias_current_high_alarm),
        ),
        Boolean.reading(
            "lane_laser_bias_current_low_alarm",
            b(l.lane_laser_bias_current_low_alarm),
        ),
        Boolean.reading(
            "lane_laser_bias_current_high_warning",
            b(l.lane_laser_bias_current_high_warning),
        ),
        Boolean.reading(
            "lane_laser_bias_current_low_warning",
            b(l.lane_laser_bias_current_low_warning),
        ),
        Boolean.reading("lane_tx_loss_of_signal_alarm", b(l.lane_tx_loss_of_signal_alarm)),
        Boolean.reading("lane_rx_loss_of_signal_alarm", b(l.lane_rx_loss_of_signal_alarm)),
        Boolean.reading("lane_tx_laser_disabled_alarm", b(l.lane_tx_laser_disabled_alarm)),
    ]
    .into_iter()
    .map(|r| r.with("lane_number", lane.clone()))
    .collect()
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReadingValue;

    fn ctx() -> SensorContext {
        SensorContext {
            sensor_name: "sensor".into(),
            system_id: "test".into(),
            component_id: 2,
            sub_component_id: 0,
        }
    }

    fn block(name: Option<&str>, lanes: u32) -> OpticsInfos {
        OpticsInfos {
            if_name: name.map(String::from),
            optics_diag_stats: Some(OpticsDiagStats {
                optics_type: Some(3),
                module_temp: Some(38.5),
                module_temp_high_alarm: Some(true),
                optics_lane_diag_stats: (0..lanes)
                    .map(|n| OpticsDiagLaneStats {
                        lane_number: Some(n),
                        lane_laser_output_power_dbm: Some(-1.5 - f64::from(n)),
                        lane_rx_loss_of_signal_alarm: Some(n == 1),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn reading_count_follows_lanes() {
        for lanes in [0, 1, 4, 8] {
            let readings = optics_readings(&block(Some("et-0/0/0"), lanes));
            assert_eq!(
                readings.len(),
                MODULE_READINGS + LANE_READINGS * lanes as usize
            );
        }
    }

    #[test]
    fn module_readings_come_first_in_fixed_order() {
        let readings = optics_readings(&block(Some("et-0/0/0"), 1));
        assert_eq!(readings[0].name, "optics_type");
        assert_eq!(readings[0].value, ReadingValue::Uint(3));
        assert_eq!(readings[1].name, "module_temp");
        assert_eq!(readings[1].kind, OutputKind::Temperature);
        assert_eq!(readings[1].value, ReadingValue::Float(38.5));
        assert_eq!(readings[18].name, "module_temp_high_alarm");
        assert_eq!(readings[18].value, ReadingValue::Bool(true));
        assert_eq!(readings[21].name, "module_temp_low_warning");
        assert_eq!(readings[22].name, "lane_laser_temperature");
        assert!(
            readings[..MODULE_READINGS]
                .iter()
                .all(|r| r.context_value("lane_number").is_none())
        );
    }

    #[test]
    fn lane_readings_are_tagged() {
        let readings = optics_readings(&block(Some("et-0/0/0"), 2));
        let lane1: Vec<_> = readings
            .iter()
            .filter(|r| r.context_value("lane_number") == Some("1"))
            .collect();
        assert_eq!(lane1.len(), LANE_READINGS);

        let power = lane1
            .iter()
            .find(|r| r.name == "lane_laser_output_power_dbm")
            .unwrap();
        assert_eq!(power.value, ReadingValue::Float(-2.5));
        assert_eq!(power.kind, OutputKind::DecibelMilliwatts);

        let los = lane1
            .iter()
            .find(|r| r.name == "lane_rx_loss_of_signal_alarm")
            .unwrap();
        assert_eq!(los.value, ReadingValue::Bool(true));
    }

    #[test]
    fn missing_stats_emit_zero_values() {
        let info = OpticsInfos {
            if_name: Some("xe-0/0/1".into()),
            ..Default::default()
        };
        let readings = optics_readings(&info);
        assert_eq!(readings.len(), MODULE_READINGS);
        assert_eq!(readings[1].value, ReadingValue::Float(0.0));
        assert_eq!(readings[21].value, ReadingValue::Bool(false));
    }

    #[test]
    fn extract_builds_one_record_per_block() {
        let optics = Optics {
            optics_diag: vec![block(Some("et-0/0/0"), 4), block(Some("et-0/0/1"), 0)],
        };
        let records = OpticsExtractor.extract(&ctx(), Some(&optics)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].descriptor.info, "test interface et-0/0/0");
        assert_eq!(records[0].readings.len(), 22 + 19 * 4);
        assert_eq!(records[1].readings.len(), 22);
    }

    #[test]
    fn absent_payload_is_empty() {
        let records = OpticsExtractor.extract(&ctx(), None).unwrap();
        assert!(records.is_empty());

        let records = OpticsExtractor
            .extract(&ctx(), Some(&Optics::default()))
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn unnamed_block_fails_alone() {
        let good = block(Some("et-0/0/0"), 1);
        let bad = block(None, 1);

        let err = OpticsExtractor.extract_block(&ctx(), &bad).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingInterfaceName { .. }));
        assert!(OpticsExtractor.extract_block(&ctx(), &good).is_ok());

        // No payload inteiro, o erro é propagado
        let optics = Optics {
            optics_diag: vec![good, bad],
        };
        assert!(OpticsExtractor.extract(&ctx(), Some(&optics)).is_err());
    }

    #[test]
    fn missing_system_id_fails() {
        let ctx = SensorContext {
            system_id: String::new(),
            ..ctx()
        };
        let err = OpticsExtractor
            .extract_block(&ctx, &block(Some("et-0/0/0"), 0))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::MissingSystemId { .. }));
    }

    #[test]
    fn identical_input_gives_identical_output() {
        let info = block(Some("et-0/0/0"), 4);
        assert_eq!(optics_readings(&info), optics_readings(&info));
    }
}
