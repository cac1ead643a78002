use clap::Parser;
use hensei::prelude::*;
use serde::Deserialize;
use std::fs;
use std::time::Instant;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the catalog manifest format and are only used here
// for conversion.

#[derive(Deserialize)]
struct RawCatalog {
    operations: Vec<RawOperation>,
    #[serde(default)]
    subtypes: Vec<(String, String)>,
    #[serde(default)]
    entities: Vec<String>,
}

#[derive(Deserialize)]
struct RawOperation {
    name: String,
    #[serde(default)]
    input: Vec<RawParameter>,
    output: TypeSignature,
    #[serde(default)]
    blocking: bool,
    #[serde(default)]
    entity_refs: Vec<String>,
    #[serde(default)]
    terminal: bool,
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    #[serde(rename = "type")]
    ty: TypeSignature,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    external: bool,
}

fn default_required() -> bool {
    true
}

// --- Converter Implementation ---
// Conversion from the raw JSON model to hensei's canonical Catalog.

impl IntoCatalog for RawCatalog {
    fn into_catalog(self) -> std::result::Result<Catalog, hensei::error::ConversionError> {
        let mut builder = Catalog::builder();
        for (sub, sup) in self.subtypes {
            builder = builder.declare_subtype(sub, sup);
        }
        for raw in self.operations {
            let params = raw
                .input
                .into_iter()
                .map(|p| Parameter {
                    name: p.name,
                    ty: p.ty,
                    required: p.required,
                    external: p.external,
                })
                .collect();
            let mut descriptor = OperationDescriptor::new(
                raw.name,
                InputSignature::of(params),
                raw.output,
            )
            .with_entity_refs(raw.entity_refs);
            if raw.blocking {
                descriptor = descriptor.blocking();
            }
            if raw.terminal {
                descriptor = descriptor.terminal();
            }
            builder = builder.register(descriptor);
        }
        Ok(builder.build())
    }
}

/// Compile an operation catalog manifest into an orchestration plan
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the catalog manifest JSON file
    catalog_path: String,

    /// Write the compiled plan artifact (bincode) to this path
    #[arg(short, long)]
    plan_out: Option<String>,

    /// Print the plan of one group with nested groups expanded
    #[arg(short, long)]
    expand: Option<String>,

    /// Print the emitted plan as JSON instead of text
    #[arg(short, long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // --- 1. File Loading ---
    let manifest_json = fs::read_to_string(&cli.catalog_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read catalog file '{}': {}",
            &cli.catalog_path, e
        ))
    });

    // --- 2. Parsing and Conversion ---
    let raw_catalog: RawCatalog = serde_json::from_str(&manifest_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse catalog JSON: {}", e)));
    let entities = StaticEntityRegistry::new(raw_catalog.entities.clone());
    let catalog = raw_catalog
        .into_catalog()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert catalog: {}", e)));

    // --- 3. Compilation ---
    println!(
        "Compiling {} registered operations...",
        catalog.len()
    );
    let compile_start = Instant::now();
    let compilation = Compiler::builder(catalog)
        .with_entity_registry(entities)
        .build()
        .compile();
    let compile_duration = compile_start.elapsed();

    let errors = compilation.diagnostics.errors().count();
    let warnings = compilation.diagnostics.warnings().count();
    println!(
        "Compilation finished in {:?}: {} group plan(s), {} error(s), {} warning(s)",
        compile_duration,
        compilation.plan.groups.len(),
        errors,
        warnings
    );

    for diagnostic in compilation.diagnostics.all() {
        eprintln!("  {}", diagnostic);
    }

    // --- 4. Output ---
    if cli.json {
        let rendered = serde_json::to_string_pretty(&compilation.plan)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to encode plan JSON: {}", e)));
        println!("{rendered}");
    } else {
        print!("{}", hensei::plan::render(&compilation.plan));
    }

    if let Some(group) = cli.expand {
        match compilation.plan.expanded_batches(&group) {
            Some(batches) => {
                println!("expanded batches of '{}':", display_group(&group));
                for (index, batch) in batches.iter().enumerate() {
                    println!("  batch {index}: {}", batch.join(", "));
                }
            }
            None => eprintln!(
                "No plan was emitted for group '{}'",
                display_group(&group)
            ),
        }
    }

    if let Some(path) = cli.plan_out {
        compilation
            .plan
            .save(&path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to save plan artifact: {}", e)));
        println!("Plan artifact written to '{}'", path);
    }

    // A sample of the root aggregate shape helps catch wiring surprises
    // without running anything.
    if let Some(root) = compilation.plan.root() {
        let steps: Vec<&str> = root.step_ids();
        if !steps.is_empty() {
            println!("root steps: {}", steps.join(", "));
        }
    }

    if errors > 0 {
        std::process::exit(1);
    }
}

fn display_group(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
