//! End-to-end tree growth and ensemble training.

use ranke_rs::testing::synthetic_ranking;
use ranke_rs::training::{
    pairwise_accuracy, EnsembleParams, GradientTreeTrainer, Rmse, TreeGrower, TreeParams,
    Verbosity, Metric,
};

#[test]
fn grow_to_target_hits_the_leaf_budget() {
    let ds = synthetic_ranking(6, 12, 4, 19);

    for num_leaves in [2usize, 5, 9] {
        let params = TreeParams {
            num_leaves,
            num_steps: 0,
        };
        let mut grower = TreeGrower::from_labels(ds.docs(), params).unwrap();
        grower.grow_to_target().unwrap();

        let tree = grower.into_tree();
        assert_eq!(tree.n_leaves(), num_leaves);
        assert_eq!(tree.n_nodes(), 2 * num_leaves - 1);
        tree.validate().unwrap();
    }
}

#[test]
fn deeper_trees_fit_labels_more_tightly() {
    let ds = synthetic_ranking(6, 12, 4, 19);
    let labels: Vec<f64> = ds.docs().iter().map(|d| f64::from(d.label())).collect();

    let rmse_for = |num_leaves: usize| -> f64 {
        let params = TreeParams {
            num_leaves,
            num_steps: 0,
        };
        let mut grower = TreeGrower::from_labels(ds.docs(), params).unwrap();
        grower.grow_to_target().unwrap();
        let tree = grower.into_tree();
        let preds: Vec<f64> = ds
            .docs()
            .iter()
            .map(|d| f64::from(tree.predict(d.features())))
            .collect();
        Rmse.compute(&preds, &labels)
    };

    let shallow = rmse_for(2);
    let deep = rmse_for(16);
    assert!(deep <= shallow, "deep {deep} vs shallow {shallow}");
}

#[test]
fn gradient_ensemble_learns_the_ranking() {
    let ds = synthetic_ranking(10, 9, 4, 31);
    let params = EnsembleParams {
        tree: TreeParams {
            num_leaves: 8,
            num_steps: 0,
        },
        learning_rate: 0.2,
        verbosity: Verbosity::Silent,
    };
    let mut trainer = GradientTreeTrainer::new(&ds, params);
    trainer.train(25).unwrap();

    let labels: Vec<f64> = ds.docs().iter().map(|d| f64::from(d.label())).collect();
    let baseline = Rmse.compute(&vec![0.0; labels.len()], &labels);
    let rmse = Rmse.compute(trainer.predictions(), &labels);
    assert!(
        rmse < 0.5 * baseline,
        "train rmse {rmse} vs baseline {baseline}"
    );

    let ensemble = trainer.into_ensemble();
    assert_eq!(ensemble.n_trees(), 25);

    let scores: Vec<f64> = ds
        .docs()
        .iter()
        .map(|d| f64::from(ensemble.predict(d.features())))
        .collect();
    let acc = pairwise_accuracy(&ds, &scores);
    assert!(acc > 0.8, "pairwise accuracy {acc}");
}
