use std::fmt;
use thiserror::Error;

use crate::services::{AuthError, GatewayError};

/// Reachability targets checked at the top of every cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeTarget {
    Internet,
    Device,
    Backend,
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeTarget::Internet => write!(f, "internet"),
            ProbeTarget::Device => write!(f, "printer"),
            ProbeTarget::Backend => write!(f, "backend"),
        }
    }
}

/// Error classification, one per escalation path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Authentication,
    OrderFetch,
    OrderPrint,
    OrderUpdate,
    Unexpected,
}

/// Cycle errors
///
/// `Display` is the technical log line. [`AgentError::user_message`] is the
/// operator-facing text shown in the status; the two never coincide.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0} unreachable")]
    Connectivity(ProbeTarget),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("fetching orders failed: {0}")]
    OrderFetch(#[source] GatewayError),

    #[error("order {order_id} not printed after {attempts} attempts")]
    OrderPrint { order_id: i64, attempts: u32 },

    #[error("print status of order {order_id} not updated: {source}")]
    OrderUpdate {
        order_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AgentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AgentError::Connectivity(_) => ErrorKind::Connectivity,
            AgentError::Authentication(_) => ErrorKind::Authentication,
            AgentError::OrderFetch(_) => ErrorKind::OrderFetch,
            AgentError::OrderPrint { .. } => ErrorKind::OrderPrint,
            AgentError::OrderUpdate { .. } => ErrorKind::OrderUpdate,
            AgentError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Portuguese message for the operator
    pub fn user_message(&self) -> &'static str {
        match self {
            AgentError::Connectivity(ProbeTarget::Internet) => {
                "Verifique a sua conexão à internet"
            }
            AgentError::Connectivity(ProbeTarget::Device) => {
                "A conexão com a impressora falhou. Tente verificar o estado da impressora"
            }
            AgentError::Connectivity(ProbeTarget::Backend) => "A conexão com o servidor falhou",
            AgentError::Authentication(_) => "Aconteceu um erro ao autenticar no sistema",
            AgentError::OrderFetch(_) => "Aconteceu um erro ao pegar os pedidos",
            AgentError::OrderPrint { .. } => "Aconteceu um erro ao processar os pedidos",
            AgentError::OrderUpdate { .. } => "Aconteceu um erro ao atualizar os pedidos",
            AgentError::Unexpected(_) => "Aconteceu um erro inesperado",
        }
    }

    /// Status line shown after escalation
    pub fn status_line(&self) -> String {
        format!("ERRO: {}. Reinicie o programa.", self.user_message())
    }
}
