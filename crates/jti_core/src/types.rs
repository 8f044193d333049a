//! Modelo normalizado de métricas e dispositivos.
//!
//! Tudo que sai dos extratores (Optics, Port) é expresso nestes tipos,
//! independente do formato GPB de origem.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ──────────────────────────────────────────────
// Catálogo de outputs
// ──────────────────────────────────────────────

/// Unidade de um output (nome por extenso + símbolo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub name: &'static str,
    pub symbol: &'static str,
}

/// Outputs conhecidos. Cada leitura é emitida com exatamente um deles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Boolean,
    BytesCounter,
    PacketsCounter,
    BytesPerSecond,
    PacketsPerSecond,
    MegabitPerSecond,
    Temperature,
    DecibelMilliwatts,
    Milliamperes,
    TimeTicks,
    Status,
    String,
    Timestamp,
    Number,
}

impl OutputKind {
    /// Nome do output no catálogo.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::BytesCounter => "bytes",
            Self::PacketsCounter => "packets",
            Self::BytesPerSecond => "bytes-per-second",
            Self::PacketsPerSecond => "packets-per-second",
            Self::MegabitPerSecond => "megabit-per-second",
            Self::Temperature => "temperature",
            Self::DecibelMilliwatts => "decibel-milliwatt",
            Self::Milliamperes => "milliampere",
            Self::TimeTicks => "time-ticks",
            Self::Status => "status",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Number => "number",
        }
    }

    /// Tipo semântico (bool, counter, throughput, ...).
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::BytesCounter | Self::PacketsCounter => "counter",
            Self::BytesPerSecond | Self::PacketsPerSecond | Self::MegabitPerSecond => "throughput",
            Self::Temperature => "temperature",
            Self::DecibelMilliwatts => "power",
            Self::Milliamperes => "current",
            Self::TimeTicks => "time",
            Self::Status => "status",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Number => "number",
        }
    }

    pub fn unit(self) -> Option<Unit> {
        let (name, symbol) = match self {
            Self::BytesCounter => ("bytes", "b"),
            Self::PacketsCounter => ("packets", "pkts"),
            Self::BytesPerSecond => ("bytes per second", "bytes/s"),
            Self::PacketsPerSecond => ("packets per second", "pkts/s"),
            Self::MegabitPerSecond => ("Megabits per second", "Mbit/s"),
            Self::Temperature => ("celsius", "C"),
            Self::DecibelMilliwatts => ("decibel-milliwatt", "dBm"),
            Self::Milliamperes => ("milliamperes", "mA"),
            Self::TimeTicks => ("ticks", "ticks"),
            _ => return None,
        };
        Some(Unit { name, symbol })
    }

    /// Cria uma leitura deste output para a métrica `metric`.
    pub fn reading(self, metric: &str, value: impl Into<ReadingValue>) -> Reading {
        let mut context = BTreeMap::new();
        context.insert("metric".to_string(), metric.to_string());
        Reading {
            name: metric.to_string(),
            kind: self,
            value: value.into(),
            context,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ──────────────────────────────────────────────
// Leituras
// ──────────────────────────────────────────────

/// Valor de uma leitura.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Bool(bool),
    Uint(u64),
    Float(f64),
    Text(String),
}

impl From<bool> for ReadingValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u32> for ReadingValue {
    fn from(v: u32) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u64> for ReadingValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for ReadingValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ReadingValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Uma métrica tipada, com contexto (direção, lane, fila, nome da métrica).
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub name: String,
    pub kind: OutputKind,
    pub value: ReadingValue,
    pub context: BTreeMap<String, String>,
}

impl Reading {
    /// Adiciona uma entrada de contexto.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// `nome=valor símbolo`, com lane/fila/direção quando presentes.
impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for key in ["direction", "lane_number", "queue_number"] {
            if let Some(v) = self.context_value(key) {
                write!(f, "[{key}={v}]")?;
            }
        }
        write!(f, "={}", self.value)?;
        if let Some(unit) = self.kind.unit() {
            write!(f, " {}", unit.symbol)?;
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Contexto do sensor / descritor de dispositivo
// ──────────────────────────────────────────────

/// Os quatro campos compartilhados do envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensorContext {
    pub sensor_name: String,
    pub system_id: String,
    pub component_id: u32,
    pub sub_component_id: u32,
}

/// Identidade e metadados de uma entidade física observada no stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Tipo do dispositivo (ex: "interface")
    pub kind: String,
    /// Descrição legível (ex: "mx960 interface et-0/0/0")
    pub info: String,
    pub tags: Vec<String>,
    /// Contexto próprio do dispositivo (tem precedência sobre o global)
    pub context: HashMap<String, String>,
    /// Componentes usados apenas para derivar a identidade
    pub id_components: HashMap<String, String>,
}

/// Par (descritor, leituras) entregue pelo extrator ao reconciliador.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub descriptor: DeviceDescriptor,
    pub readings: Vec<Reading>,
}
