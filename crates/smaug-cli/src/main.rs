use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use smaug_core::logging::{init_logging, LoggingConfig};
use smaug_core::Result;
use smaug_nn::{count_depthwise_layers, count_exported_layers, load_model, load_tensor};
use smaug_txt::{export, padded_element_count, total_written_parameters, ExportRequest, TxtModel};

#[derive(Parser)]
#[command(
    name = "smaug",
    about = "Export trained models to the SMAUG text format",
    long_about = "Export a trained model (JSON layer manifest + safetensors weights) to the\nsection-delimited text file read by the SMAUG simulator.",
    version
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write <NAME><arch>.txt with weights, one sample input and its label
    Export {
        /// JSON layer manifest
        #[arg(long)]
        manifest: PathBuf,
        /// Safetensors file holding the layer weights
        #[arg(long)]
        weights: PathBuf,
        /// Safetensors file holding the sample inputs and labels
        #[arg(long)]
        samples: PathBuf,
        /// Name of the input tensor in the samples file
        #[arg(long, default_value = "x")]
        input_name: String,
        /// Name of the one-hot label tensor in the samples file
        #[arg(long, default_value = "y")]
        label_name: String,
        /// Model name, used as the output file prefix
        #[arg(long)]
        name: String,
        /// Target architecture, e.g. SMIV or SMV
        #[arg(long)]
        arch: String,
        /// Innermost-dimension alignment (0 disables padding)
        #[arg(long, default_value = "0")]
        alignment: usize,
        /// Write Dense kernels column-major
        #[arg(long)]
        transpose: bool,
        /// Directory for the output file
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Show how each layer of a model would be exported
    Inspect {
        /// JSON layer manifest
        #[arg(long)]
        manifest: PathBuf,
        /// Safetensors file holding the layer weights
        #[arg(long)]
        weights: PathBuf,
        /// Innermost-dimension alignment (0 disables padding)
        #[arg(long, default_value = "0")]
        alignment: usize,
        /// Account for column-major Dense kernels
        #[arg(long)]
        transpose: bool,
    },
    /// Parse an exported file and check its element counts
    Check {
        /// Exported .txt file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    });

    let result = match cli.command {
        Commands::Export {
            manifest,
            weights,
            samples,
            input_name,
            label_name,
            name,
            arch,
            alignment,
            transpose,
            output_dir,
        } => cmd_export(
            &manifest,
            &weights,
            &samples,
            &input_name,
            &label_name,
            name,
            arch,
            alignment,
            transpose,
            output_dir,
        ),
        Commands::Inspect {
            manifest,
            weights,
            alignment,
            transpose,
        } => cmd_inspect(&manifest, &weights, alignment, transpose),
        Commands::Check { file } => cmd_check(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_export(
    manifest: &Path,
    weights: &Path,
    samples: &Path,
    input_name: &str,
    label_name: &str,
    name: String,
    arch: String,
    alignment: usize,
    transpose: bool,
    output_dir: PathBuf,
) -> Result<()> {
    println!("=== SMAUG Export ===");
    println!("Manifest:  {}", manifest.display());
    println!("Weights:   {}", weights.display());
    println!("Samples:   {}", samples.display());
    println!("Arch:      {arch}");
    println!("Alignment: {alignment}");
    println!("Transpose: {transpose}");
    println!();

    let model = load_model(manifest, weights)?;
    let inputs = load_tensor(samples, input_name)?;
    let labels = load_tensor(samples, label_name)?;

    let request = ExportRequest::builder()
        .model(&model)
        .sample_inputs(inputs)
        .sample_labels(labels)
        .model_name(name)
        .architecture(arch)
        .data_alignment(alignment)
        .transpose_weights(transpose)
        .output_dir(output_dir)
        .build()?;

    let summary = export(&request)?;

    if summary.depthwise_layers > 0 {
        println!(
            "Warning: {} depthwise convolution layer(s); their biases are not exported.",
            summary.depthwise_layers
        );
    }
    if summary.skipped_layers > 0 {
        println!("Skipped {} layer(s) with no SMAUG counterpart.", summary.skipped_layers);
    }
    println!("Layers:    {} (including input)", summary.num_layers);
    println!("Weights:   {} elements", summary.weight_elems);
    println!("Data:      {} elements", summary.data_elems);
    println!("Label:     {}", summary.label);
    println!(
        "Model parameters saved to {} ({:.1} KB)",
        summary.path.display(),
        summary.bytes_written as f64 / 1024.0
    );
    Ok(())
}

fn cmd_inspect(manifest: &Path, weights: &Path, alignment: usize, transpose: bool) -> Result<()> {
    let model = load_model(manifest, weights)?;
    let layers = model.inspect();

    println!(
        "=== {} ({} layers) ===",
        model.name().unwrap_or("model"),
        layers.len()
    );
    println!("{:<24} {:<20} {:<18} {:>10}", "Layer", "Kind", "Shape", "Padded");
    println!("{}", "-".repeat(75));

    for layer in &layers {
        if !layer.kind().is_exported() {
            println!("{:<24} {:<20} {:<18} {:>10}", layer.name(), "(skipped)", "", "");
            continue;
        }
        println!("{:<24} {:<20}", layer.name(), layer.kind().as_str());
        let transposed = transpose && layer.kind().is_transposable();
        for w in layer.exported_weights() {
            let w = if transposed { w.t() } else { w.clone() };
            println!(
                "{:<24} {:<20} {:<18} {:>10}",
                "",
                "",
                w.shape().to_string(),
                padded_element_count(w.shape().dims(), alignment)
            );
        }
    }

    println!();
    println!("NUM_LAYERS     = {}", count_exported_layers(&layers) + 1);
    println!("DATA_ALIGNMENT = {alignment}");
    println!(
        "Weights        = {} elements",
        total_written_parameters(&layers, alignment, transpose)
    );
    let depthwise = count_depthwise_layers(&layers);
    if depthwise > 0 {
        println!("Depthwise      = {depthwise} (biases not exported)");
    }
    Ok(())
}

fn cmd_check(file: &Path) -> Result<()> {
    let model = TxtModel::load(file)?;

    println!("=== {} ===", file.display());
    println!("Architecture:   {}", model.architecture);
    println!("NUM_LAYERS:     {}", model.num_layers);
    println!("DATA_ALIGNMENT: {}", model.data_alignment);
    for (kind, section) in model.sections() {
        println!("{:<15} {section}", format!("{kind}:"));
    }

    model.validate()?;
    match model.label() {
        Some(label) => println!("OK (label {label})"),
        None => println!("OK"),
    }
    Ok(())
}
