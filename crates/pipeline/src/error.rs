//! Failure taxonomy of one pipeline invocation.
//!
//! The `Display` text of every variant is the stable message returned to the
//! caller. Provider bodies, storage errors and database errors travel in
//! `diagnostic` fields and are only ever logged.

use fotoai_core::artifact::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Requisição inválida: {0}")]
    InvalidRequest(String),

    #[error("Usuário não autenticado.")]
    Unauthenticated,

    #[error("Créditos insuficientes.")]
    InsufficientCredits,

    /// Carries the operator-supplied maintenance message.
    #[error("{0}")]
    MaintenanceMode(String),

    #[error("Categoria de processamento desconhecida: '{0}'")]
    UnknownCategory(String),

    #[error("Prompt para a categoria '{0}' não encontrado.")]
    MissingPromptConfiguration(String),

    #[error("Erro ao gerar URL assinada para a imagem.")]
    SourceUnavailable { diagnostic: String },

    #[error("Falha ao obter a imagem melhorada.")]
    ProviderCallFailed {
        status: Option<u16>,
        diagnostic: String,
    },

    #[error("A IA de melhoria não retornou uma imagem válida.")]
    ProviderResponseInvalid { diagnostic: String },

    #[error("A IA de recorte não retornou uma imagem válida.")]
    BackgroundRemovalFailed { diagnostic: String },

    #[error("Falha ao gerar a imagem de fundo.")]
    BackgroundGenerationFailed { diagnostic: String },

    #[error("Falha ao salvar a imagem processada.")]
    StorageWriteFailed { diagnostic: String },

    #[error("Falha ao registrar o processamento.")]
    SettlementFailed { diagnostic: String },

    #[error("Serviço temporariamente indisponível.")]
    ServiceUnavailable { diagnostic: String },
}

impl PipelineError {
    /// Machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::Unauthenticated => "unauthenticated",
            Self::InsufficientCredits => "insufficient_credits",
            Self::MaintenanceMode(_) => "maintenance_mode",
            Self::UnknownCategory(_) => "unknown_category",
            Self::MissingPromptConfiguration(_) => "missing_prompt_configuration",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::ProviderCallFailed { .. } => "provider_call_failed",
            Self::ProviderResponseInvalid { .. } => "provider_response_invalid",
            Self::BackgroundRemovalFailed { .. } => "background_removal_failed",
            Self::BackgroundGenerationFailed { .. } => "background_generation_failed",
            Self::StorageWriteFailed { .. } => "storage_write_failed",
            Self::SettlementFailed { .. } => "settlement_failed",
            Self::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    /// Internal detail for logs. Never sent to the caller.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::SourceUnavailable { diagnostic }
            | Self::ProviderCallFailed { diagnostic, .. }
            | Self::ProviderResponseInvalid { diagnostic }
            | Self::BackgroundRemovalFailed { diagnostic }
            | Self::BackgroundGenerationFailed { diagnostic }
            | Self::StorageWriteFailed { diagnostic }
            | Self::SettlementFailed { diagnostic }
            | Self::ServiceUnavailable { diagnostic } => Some(diagnostic),
            _ => None,
        }
    }

    /// Map a failure of the primary enhancement call.
    pub(crate) fn from_enhancement(err: ProviderError) -> Self {
        match err {
            ProviderError::Call { status, diagnostic } => {
                Self::ProviderCallFailed { status, diagnostic }
            }
            ProviderError::InvalidResponse { diagnostic } => {
                Self::ProviderResponseInvalid { diagnostic }
            }
        }
    }

    pub(crate) fn from_background_removal(err: ProviderError) -> Self {
        Self::BackgroundRemovalFailed {
            diagnostic: err.to_string(),
        }
    }

    pub(crate) fn from_background_generation(err: ProviderError) -> Self {
        Self::BackgroundGenerationFailed {
            diagnostic: err.to_string(),
        }
    }
}
