//! Builds the sink set for a compiled configuration.

use fuselog_core::Configuration;
use tracing::debug;

use crate::error::SinkResult;
use crate::sink::{ConsoleSink, DocumentSink, FileSink, SinkEnvironment, SinkSet};

/// Builds one sink per active section, in console, file, mongo order.
///
/// The file sink creates its directory first; a directory that cannot be
/// created aborts the whole build.
pub fn build_sinks(
    file_tag: &str,
    config: &Configuration,
    env: &SinkEnvironment,
) -> SinkResult<SinkSet> {
    let mut sinks = SinkSet::new();

    if config.console.active {
        sinks.push(Box::new(ConsoleSink::new(
            config.console.level,
            env.console.clone(),
            env.console_format,
        )));
    }

    if config.file.active {
        let file_name = env.file_naming.file_name(file_tag);
        sinks.push(Box::new(FileSink::open(
            config.file.level,
            &config.file.logpath,
            &file_name,
            &env.files,
        )?));
    }

    if config.mongo.active {
        sinks.push(Box::new(DocumentSink::new(
            config.mongo.level,
            &config.mongo.db,
            config.mongo.safe,
            file_tag,
            env.documents.as_ref(),
        )));
    }

    debug!(file_tag, sinks = ?sinks.kinds(), "Built sink set");
    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::sink::{FileNaming, MemoryDocumentStore, MemoryWriter, SinkKind, SinkParams};
    use crate::sink::ConsoleTarget;
    use fuselog_core::Severity;
    use std::sync::Arc;

    fn env() -> SinkEnvironment {
        SinkEnvironment {
            console: ConsoleTarget::writer(MemoryWriter::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
            ..SinkEnvironment::default()
        }
    }

    fn config_with(console: bool, file: bool, mongo: bool, logpath: &str) -> Configuration {
        let mut config = Configuration::default();
        config.console.active = console;
        config.file.active = file;
        config.file.logpath = logpath.to_string();
        config.mongo.active = mongo;
        config
    }

    #[test]
    fn test_one_sink_per_active_section() {
        let tmp = tempfile::tempdir().unwrap();
        let logpath = format!("{}/logs/", tmp.path().display());

        let cases = [
            ((false, false, false), vec![]),
            ((true, false, false), vec![SinkKind::Console]),
            ((false, true, false), vec![SinkKind::File]),
            ((false, false, true), vec![SinkKind::Mongo]),
            ((true, false, true), vec![SinkKind::Console, SinkKind::Mongo]),
            (
                (true, true, true),
                vec![SinkKind::Console, SinkKind::File, SinkKind::Mongo],
            ),
        ];

        for ((console, file, mongo), expected) in cases {
            let config = config_with(console, file, mongo, &logpath);
            let sinks = build_sinks("svc", &config, &env()).unwrap();
            assert_eq!(sinks.kinds(), expected);
        }
    }

    #[test]
    fn test_descriptor_parameters() {
        let tmp = tempfile::tempdir().unwrap();
        let logpath = format!("{}/logs/", tmp.path().display());
        let mut config = config_with(true, true, true, &logpath);
        config.console.level = Severity::Warning;
        config.mongo.safe = false;

        let descriptors = build_sinks("svc", &config, &env()).unwrap().descriptors();
        assert_eq!(descriptors[0].level, Severity::Warning);
        assert_eq!(
            descriptors[1].params,
            SinkParams::File {
                path: tmp.path().join("logs").join("all.log"),
            }
        );
        assert_eq!(
            descriptors[2].params,
            SinkParams::Mongo {
                db: "mongodb://localhost:27017/Logs".to_string(),
                collection: "svc".to_string(),
                safe: false,
            }
        );
        assert!(tmp.path().join("logs").is_dir());
    }

    #[test]
    fn test_per_caller_file_naming() {
        let tmp = tempfile::tempdir().unwrap();
        let logpath = format!("{}/", tmp.path().display());
        let env = SinkEnvironment {
            file_naming: FileNaming::PerCaller,
            ..env()
        };
        let sinks = build_sinks("billing", &config_with(false, true, false, &logpath), &env)
            .unwrap();
        assert_eq!(
            sinks.descriptors()[0].params,
            SinkParams::File {
                path: tmp.path().join("billing.log"),
            }
        );
    }

    #[test]
    fn test_directory_failure_aborts() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("file"), b"").unwrap();
        let logpath = format!("{}/file/logs/", tmp.path().display());
        let err = build_sinks("svc", &config_with(true, true, false, &logpath), &env())
            .unwrap_err();
        assert!(matches!(err, SinkError::DirectoryCreation { .. }));
    }
}
