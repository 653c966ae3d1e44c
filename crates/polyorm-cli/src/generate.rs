use crate::cli::DdlArgs;
use crate::config::ProjectConfig;
use crate::write::{GeneratedFile, WriteMode, apply_generated_files};
use polyorm::{Dialect, DialectSettings, ModelDefinition, SchemaFile};

/// Sequences, table and indexes for each model, in schema order.
pub fn render_script(dialect: &dyn Dialect, models: &[ModelDefinition]) -> anyhow::Result<String> {
    let mut out = format!("-- polyorm DDL for {}\n", dialect.rules().name);
    for model in models {
        out.push('\n');
        for sql in dialect.create_sequence_statements(model) {
            out.push_str(&sql);
            out.push('\n');
        }
        let table = dialect.create_table_statement(model).map_err(|e| {
            anyhow::anyhow!("{}: {e}", model.model_name())
        })?;
        out.push_str(&table);
        out.push('\n');
        for sql in dialect.create_index_statements(model) {
            out.push_str(&sql);
            out.push('\n');
        }
    }
    Ok(out)
}

pub fn run(args: DdlArgs) -> anyhow::Result<()> {
    let project = ProjectConfig::load(&args.config)?;
    let schema_path = match &args.schema {
        Some(path) => path.clone(),
        None => project.resolve_path(&project.file.schema),
    };
    let schema = SchemaFile::load(&schema_path)
        .map_err(|e| anyhow::anyhow!("{}: {e}", schema_path.display()))?;
    let models = schema.definitions()?;
    let base = schema.dialect.clone().unwrap_or_default();

    if let Some(kind) = args.dialect {
        let settings = project
            .file
            .targets
            .iter()
            .find(|t| t.dialect == kind)
            .and_then(|t| t.settings.as_ref())
            .map_or_else(|| base.clone(), |s| s.overlay(&base));
        let dialect = DialectSettings {
            kind: Some(kind),
            ..settings
        }
        .into_dialect(kind);
        print!("{}", render_script(dialect.as_ref(), &models)?);
        return Ok(());
    }

    let mut files = Vec::with_capacity(project.file.targets.len());
    for target in &project.file.targets {
        let settings = match &target.settings {
            Some(s) => s.overlay(&base),
            None => base.clone(),
        };
        let dialect = DialectSettings {
            kind: Some(target.dialect),
            ..settings
        }
        .into_dialect(target.dialect);
        files.push(GeneratedFile {
            path: project.resolve_path(&target.output),
            content: render_script(dialect.as_ref(), &models)?,
        });
    }

    let mode = if args.check {
        WriteMode::Check
    } else if args.dry_run {
        WriteMode::DryRun
    } else {
        WriteMode::Write
    };
    apply_generated_files(&files, mode)?;
    Ok(())
}
