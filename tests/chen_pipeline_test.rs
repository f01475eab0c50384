#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use sysid::config::{ExperimentConfig, Split};
    use sysid::data::{ChenConfig, SequenceBatcher, SequenceDataset};
    use sysid::metrics;
    use sysid::mode::RunMode;
    use sysid::predictor::Predictor;

    type Backend = NdArray<f32>;

    const TCN_EXPERIMENT: &str = r#"{
        "logdir": "log/chen_example/tcn_2",
        "dataset": "chen",
        "model": "tcn",
        "model_options": {"ksize": 2, "n_channels": [8, 8], "dilation_sizes": [1, 2], "dropout": 0.0, "io_delay": 1},
        "dataset_options": {
            "seq_len": 40,
            "train": {"ntotbatch": 5, "sd_v": 0.3, "sd_w": 0.3},
            "valid": {"ntotbatch": 2, "sd_v": 0.3, "sd_w": 0.3},
            "test": {"ntotbatch": 3, "sd_v": 0.0, "sd_w": 0.0}
        }
    }"#;

    #[test]
    fn test_batches_cover_dataset() {
        let dataset = ChenConfig::new(16, 5).init().unwrap();
        let batcher = SequenceBatcher::<Backend>::new(Default::default());

        let batches = batcher.batches(&dataset, 2, Some(11)).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.inputs.dims()[0]).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        for batch in &batches {
            let [_, nu, seq_len] = batch.inputs.dims();
            let [_, ny, _] = batch.outputs.dims();
            assert_eq!((nu, ny, seq_len), (1, 1, 16));
        }
    }

    #[test]
    fn test_experiment_runs_in_both_modes() {
        let device = Default::default();
        let experiment = ExperimentConfig::from_json(TCN_EXPERIMENT).unwrap();

        let dataset = experiment.dataset_config(Split::Test).unwrap().init().unwrap();
        assert_eq!(dataset.len(), 3);

        let mut model = experiment
            .model_config()
            .unwrap()
            .init::<Backend>(&device)
            .unwrap();
        assert_eq!(model.io_delay(), 1);
        assert_eq!(model.predictor().receptive_field(), 7);

        let batcher = SequenceBatcher::<Backend>::new(device);
        let batch = batcher.batches(&dataset, dataset.len(), None).unwrap().remove(0);

        for mode in RunMode::ALL {
            model.set_mode(mode);
            let y_pred = model
                .forward(batch.inputs.clone(), Some(batch.outputs.clone()))
                .unwrap();
            assert_eq!(y_pred.dims(), [3, 1, 40]);

            let rmse = metrics::rmse(batch.outputs.clone(), y_pred.clone()).unwrap();
            let vaf = metrics::vaf(batch.outputs.clone(), y_pred).unwrap();
            assert!(rmse.is_finite() && rmse >= 0.0, "{}: rmse {}", mode, rmse);
            assert!(vaf.is_finite(), "{}: vaf {}", mode, vaf);
        }
    }
}
