use std::fmt;

/// Kinds of failure that can occur while loading dictionaries, HMM models,
/// or the DAT cache file. Cut operations never produce these: once a
/// [`crate::dat::Dat`] / [`crate::hmm::HmmModel`] is constructed, querying it
/// cannot fail.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum JiebaErrorKind {
    OpenFileFailed,
    FileOperationError,
    MmapError,
    ValueError,
    BuildTrieError,
}

impl JiebaErrorKind {
    pub fn with_error<E>(self, source: E) -> JiebaError
    where
        anyhow::Error: From<E>,
    {
        JiebaError {
            kind: self,
            source: From::from(source),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("JiebaError(kind={kind:?}, source={source})")]
pub struct JiebaError {
    pub kind: JiebaErrorKind,
    #[source]
    source: anyhow::Error,
}

impl JiebaError {
    pub fn add_context<C>(self, ctx: C) -> Self
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        JiebaError {
            kind: self.kind,
            source: self.source.context(ctx),
        }
    }

    pub fn kind(&self) -> JiebaErrorKind {
        self.kind
    }
}

pub type JiebaResult<T> = Result<T, JiebaError>;
