use std::path::PathBuf;

/// Pipeline error taxonomy. `Io` and `Decode` are fatal; `NoUpdates` is the
/// distinct "nothing to do" outcome and must not be treated as a failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("レポートファイルの読み取りに失敗しました: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("レポート(JSON)の解析に失敗しました")]
    Decode(#[from] serde_json::Error),

    #[error("レポートに実行可能なOSパッケージ更新が見つかりませんでした")]
    NoUpdates,
}

impl Error {
    pub fn is_no_updates(&self) -> bool {
        matches!(self, Self::NoUpdates)
    }
}
