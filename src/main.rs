use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ferrite_learn::{
    cross_validate, evaluate, load_model, save_model, ActivationFunction, Dataset,
    DescriptorKind, MultiLayerPerceptron, OutputMap, Score, TrainConfig,
};

#[derive(Parser)]
#[command(name = "ferrite-learn")]
#[command(about = "Train and evaluate multi-layer perceptrons on CSV datasets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train on one CSV file and score on another
    Train {
        /// Training CSV (header row, label in the last column)
        #[arg(long)]
        train: PathBuf,
        /// Testing CSV; defaults to the training file
        #[arg(long)]
        test: Option<PathBuf>,
        /// Where to save the model (".model" is appended); defaults to the training path
        #[arg(long)]
        save: Option<String>,
        #[command(flatten)]
        net: NetArgs,
    },
    /// Stratified k-fold cross-validation on one CSV file
    CrossValidate {
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 5)]
        folds: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[command(flatten)]
        net: NetArgs,
    },
}

#[derive(Args)]
struct NetArgs {
    /// Hidden layer widths, e.g. "4,4"
    #[arg(long, value_delimiter = ',', default_value = "4")]
    hidden: Vec<usize>,
    /// Hidden layer activations, applied cyclically
    #[arg(long, value_delimiter = ',', default_value = "relu")]
    activation: Vec<ActivationFunction>,
    #[arg(long, default_value_t = 10_000)]
    epochs: usize,
    #[arg(long, default_value_t = 0.3)]
    rate: f64,
    /// raw | rescaled | normalized | standardized
    #[arg(long, default_value = "standardized", value_parser = parse_features)]
    features: DescriptorKind,
    /// raw | scaled
    #[arg(long, default_value = "scaled")]
    output: OutputMap,
    /// Distance within which a prediction counts as correct
    #[arg(long, default_value_t = 0.2)]
    margin: f64,
    /// Encode labels as a numeric class index instead of one-hot
    #[arg(long)]
    numeric: bool,
    /// Log every scored instance
    #[arg(long)]
    verbose: bool,
}

impl NetArgs {
    fn config(&self) -> TrainConfig {
        TrainConfig::new(self.epochs, self.rate)
            .with_features(self.features)
            .with_output_map(self.output)
    }

    fn build(&self, dataset: &Dataset) -> MultiLayerPerceptron {
        let mut shape = vec![dataset.input_dim()];
        shape.extend(self.hidden.iter().copied().filter(|&w| w > 0));
        shape.push(dataset.target_dim());
        MultiLayerPerceptron::new(&shape, &self.activation)
    }
}

fn parse_features(s: &str) -> Result<DescriptorKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "raw" => Ok(DescriptorKind::Raw),
        "rescaled" => Ok(DescriptorKind::RangeScaled),
        "normalized" => Ok(DescriptorKind::MeanNormalized),
        "standardized" => Ok(DescriptorKind::Standardized),
        other => Err(format!("unknown feature description '{other}'")),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ferrite_learn=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Train { train, test, save, net } => run_train(&train, test.as_deref(), save, &net),
        Command::CrossValidate { data, folds, seed, net } => run_cross_validate(&data, folds, seed, &net),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_train(
    train_path: &std::path::Path,
    test_path: Option<&std::path::Path>,
    save: Option<String>,
    net: &NetArgs,
) -> ferrite_learn::Result<()> {
    let training = Dataset::from_csv_path(train_path, !net.numeric, None)?;
    let testing = match test_path {
        Some(p) => {
            let mut testing = Dataset::from_csv_path(p, !net.numeric, None)?;
            testing.align_labels(&training)?;
            testing
        }
        None => training.clone(),
    };
    if !training.has_next() {
        warn!(path = %train_path.display(), "training set is empty, nothing to do");
        return Ok(());
    }
    let model_path = save.unwrap_or_else(|| train_path.display().to_string());

    let mut restored = restore_model(&model_path, &training)?;

    let mut network = net.build(&training);
    network.train_network(training.inputs(), training.targets(), &net.config());

    let mut score = Score::new(training.labels().clone(), net.margin);
    evaluate(&mut score, &mut network, testing.inputs(), testing.targets(), net.verbose);
    println!("{}", score.print_summary());

    if let Some(saved) = restored.as_mut() {
        let mut saved_score = Score::new(training.labels().clone(), net.margin);
        evaluate(&mut saved_score, saved, testing.inputs(), testing.targets(), net.verbose);
        println!("Restored model:{}", saved_score.print_summary());
    }

    save_model(&network, &model_path)
}

/// Loads the model saved at `model_path` if it fits `training`'s widths.
fn restore_model(model_path: &str, training: &Dataset) -> ferrite_learn::Result<Option<MultiLayerPerceptron>> {
    let saved = match load_model::<MultiLayerPerceptron>(model_path) {
        Ok(m) => m,
        Err(e) if e.is_not_found() => {
            info!("no saved model at {model_path}, training from scratch");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    if saved.num_inputs() != training.input_dim() || saved.num_outputs() != training.target_dim() {
        warn!(
            path = model_path,
            saved_inputs = saved.num_inputs(),
            saved_outputs = saved.num_outputs(),
            inputs = training.input_dim(),
            outputs = training.target_dim(),
            "saved model does not fit the training data, ignoring it"
        );
        return Ok(None);
    }
    Ok(Some(saved))
}

fn run_cross_validate(path: &std::path::Path, folds: usize, seed: u64, net: &NetArgs) -> ferrite_learn::Result<()> {
    let dataset = Dataset::from_csv_path(path, !net.numeric, None)?;
    if !dataset.has_next() {
        warn!(path = %path.display(), "dataset is empty, nothing to cross-validate");
        return Ok(());
    }
    let summaries = cross_validate(&dataset, folds, seed, || net.build(&dataset), &net.config(), net.margin);
    for (fold, summary) in summaries.iter().enumerate() {
        println!("Fold {fold}:{summary}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn net_args(extra: &[&str]) -> NetArgs {
        let mut argv = vec!["ferrite-learn", "cross-validate", "--data", "unused.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::CrossValidate { net, .. } => net,
            Command::Train { .. } => unreachable!(),
        }
    }

    #[test]
    fn cross_validating_an_all_nan_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_nan.csv");
        fs::write(&path, "a,b,label\nNaN,1,x\n2,NaN,y\n").unwrap();
        run_cross_validate(&path, 5, 1, &net_args(&["--epochs", "1"])).unwrap();
    }

    #[test]
    fn cross_validating_a_header_only_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "a,b,label\n").unwrap();
        run_cross_validate(&path, 3, 1, &net_args(&["--epochs", "1"])).unwrap();
    }

    #[test]
    fn restored_model_must_match_data_widths() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("net").display().to_string();
        save_model(&MultiLayerPerceptron::new(&[3, 2], &[ActivationFunction::Sigmoid]), &model_path).unwrap();

        let two_inputs = Dataset::from_records(
            true,
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec!["a".to_string(), "b".to_string()],
        ).unwrap();
        assert!(restore_model(&model_path, &two_inputs).unwrap().is_none());

        let three_inputs = Dataset::from_records(
            true,
            vec![vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 2.0]],
            vec!["a".to_string(), "b".to_string()],
        ).unwrap();
        let restored = restore_model(&model_path, &three_inputs).unwrap();
        assert_eq!(restored.map(|m| m.num_inputs()), Some(3));
    }

    #[test]
    fn missing_model_restores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("absent").display().to_string();
        let ds = Dataset::from_records(true, vec![vec![1.0]], vec!["a".to_string()]).unwrap();
        assert!(restore_model(&model_path, &ds).unwrap().is_none());
    }

    #[test]
    fn train_with_a_mismatched_saved_model_still_trains() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("train.csv");
        fs::write(&csv, "a,b,label\n0,1,x\n1,0,y\n").unwrap();
        let model_path = dir.path().join("model").display().to_string();
        save_model(&MultiLayerPerceptron::new(&[5, 3], &[ActivationFunction::Sigmoid]), &model_path).unwrap();

        run_train(&csv, None, Some(model_path.clone()), &net_args(&["--epochs", "2"])).unwrap();
        let saved: MultiLayerPerceptron = load_model(&model_path).unwrap();
        assert_eq!(saved.num_inputs(), 2);
    }
}
