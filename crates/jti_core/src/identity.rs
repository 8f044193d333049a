//! Identidade determinística de dispositivos.
//!
//! A identidade é a concatenação dos valores dos componentes, ordenados
//! lexicograficamente pela chave. O algoritmo é compartilhado entre o
//! reconciliador e o índice do registry; mudar a regra quebra a
//! continuidade dos dispositivos já registrados.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Dispositivo sem componentes de identidade")]
    MissingIdentityData,

    #[error("Componentes de identidade inconsistentes: esperado {expected:?}, recebido {found:?}")]
    InvalidIdentityShape {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Gera a identidade a partir dos componentes.
pub fn device_identity(components: &HashMap<String, String>) -> Result<String, IdentityError> {
    if components.is_empty() {
        return Err(IdentityError::MissingIdentityData);
    }

    let mut keys: Vec<&String> = components.keys().collect();
    keys.sort();

    let identity: String = keys.iter().map(|k| components[*k].as_str()).collect();
    debug!(identity = %identity, "Identidade de dispositivo construída");
    Ok(identity)
}

/// Conjunto de chaves dos componentes, ordenado.
pub fn key_shape(components: &HashMap<String, String>) -> BTreeSet<&str> {
    components.keys().map(String::as_str).collect()
}

/// Garante que todos os registros de uma mesma decodificação usam o
/// mesmo conjunto de chaves de identidade.
pub fn check_same_shape<'a, I>(all: I) -> Result<(), IdentityError>
where
    I: IntoIterator<Item = &'a HashMap<String, String>>,
{
    let mut expected: Option<BTreeSet<&str>> = None;
    for components in all {
        let shape = key_shape(components);
        if shape.is_empty() {
            return Err(IdentityError::MissingIdentityData);
        }
        match &expected {
            None => expected = Some(shape),
            Some(first) if *first != shape => {
                return Err(IdentityError::InvalidIdentityShape {
                    expected: first.iter().map(|s| s.to_string()).collect(),
                    found: shape.iter().map(|s| s.to_string()).collect(),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
