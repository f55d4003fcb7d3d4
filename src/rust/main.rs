use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use log::info;

use cuisine_classifier::report::{
    format_accuracy, format_confusion_table, format_sample_predictions, render_confusion_heatmap,
    render_sample_grid,
};
use cuisine_classifier::{
    assign_labels, classify_samples, prepare_data_set, BuiltinModel, DatasetManifest,
    EvaluationPipeline, ModelManager, OnnxFeatureExtractor, PipelineConfig, RbfSvm,
    RuntimeConfig, SvmParams, DEFAULT_TEST_FRACTION,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the `<class>_meals` image folders
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    /// Comma-separated cuisine list; position in the list is the label
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    /// JSON manifest of image URLs per class, used to fetch missing images
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Fraction of images held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Seed for the train/test shuffle; a fresh split is drawn when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Use this ONNX network instead of downloading the built-in one
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// SHA-256 the downloaded built-in network must match
    #[arg(long)]
    model_sha256: Option<String>,

    /// Network output to read features from (defaults to the first output)
    #[arg(long)]
    output_name: Option<String>,

    /// SVM penalty parameter
    #[arg(long, default_value_t = 1.0)]
    c: f64,

    /// RBF kernel width (defaults to 1 / number of features)
    #[arg(long)]
    gamma: Option<f64>,

    /// Where the heatmap and sample grid images are written
    #[arg(long, default_value = "reports")]
    report_dir: PathBuf,

    /// Comma-separated sample meals to classify after training, relative to the data root
    #[arg(long, value_delimiter = ',')]
    samples: Option<Vec<PathBuf>>,

    /// Skip classifying the sample meals
    #[arg(long)]
    no_samples: bool,

    /// Force a fresh download of the model file
    #[arg(short, long)]
    fresh: bool,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let mut config = match &self.classes {
            Some(classes) => PipelineConfig::with_classes(classes.clone()),
            None => PipelineConfig::default(),
        };
        config.data_root = self.data_root.clone();
        config.test_fraction = self.test_fraction;
        config.seed = self.seed;
        config.report_dir = self.report_dir.clone();
        if self.no_samples {
            config.sample_meals.clear();
        } else if let Some(samples) = &self.samples {
            config.sample_meals = samples.clone();
        }
        config
    }
}

async fn ensure_model(args: &Args) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.model_path {
        return Ok(path.clone());
    }

    let manager = ModelManager::new_default()?;
    let mut info = BuiltinModel::ResNet50.get_model_info();
    if args.model_sha256.is_some() {
        info.model_hash = args.model_sha256.clone();
    }

    if args.fresh {
        info!("Fresh download requested - removing any existing model file...");
        manager.remove_download(&info.name)?;
    }

    Ok(manager.ensure_model_downloaded(&info).await?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.pipeline_config();
    config.validate()?;

    let start_time = Instant::now();
    info!("=== Preparing data set in {:?} ===", config.data_root);
    let manifest = args.manifest.as_deref()
        .map(DatasetManifest::from_file)
        .transpose()
        .context("Failed to read dataset manifest")?;
    prepare_data_set(&config, manifest.as_ref()).await?;

    let model_path = ensure_model(&args).await.context("Failed to obtain the pretrained network")?;
    let mut characteristics = BuiltinModel::ResNet50.characteristics();
    if args.model_path.is_some() || args.output_name.is_some() {
        // Width of a custom network or output is only known after the first image
        characteristics.feature_size = None;
    }
    let extractor = OnnxFeatureExtractor::new(
        &model_path,
        characteristics,
        &RuntimeConfig::default(),
        args.output_name.clone(),
    )?;

    let records = assign_labels(&config)?;
    info!("Found {} labelled images across {} classes", records.len(), config.num_classes());

    let mut classifier = RbfSvm::new(SvmParams { c: args.c, gamma: args.gamma });
    let report = EvaluationPipeline::new(&config).run_on_records(&extractor, &mut classifier, &records)?;

    println!("{}", format_accuracy(report.accuracy_percent));
    println!("{}", format_confusion_table(&report.confusion, &config));
    render_confusion_heatmap(&report.confusion, &config, &config.report_dir.join("confusion_matrix.png"))?;

    if !args.no_samples {
        let samples = classify_samples(&extractor, &classifier, &config)?;
        println!("{}", format_sample_predictions(&samples));
        render_sample_grid(&samples, &config.report_dir.join("sample_predictions.png"))?;
    }

    info!("=== Done in {:.2?} ===", start_time.elapsed());
    Ok(())
}
