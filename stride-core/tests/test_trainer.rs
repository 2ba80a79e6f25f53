use anyhow::Result;
use stride_core::{
    dummy::{DummyAgent, DummyEnv, DummyEnvConfig},
    error::StrideError,
    record::BufferedRecorder,
    Agent, DefaultEvaluator, Trainer, TrainerConfig,
};
use tempdir::TempDir;

fn env_config() -> DummyEnvConfig {
    DummyEnvConfig::default().n_envs(2).episode_length(5)
}

#[test]
fn test_train_with_dummy_agent() -> Result<()> {
    let dir = TempDir::new("trainer")?;
    let model_dir = dir.path().join("model");
    let config = TrainerConfig::default()
        .total_timesteps(100)
        .n_steps(8)
        .model_dir(model_dir.to_str().unwrap());
    let env_config = env_config();
    let mut trainer = Trainer::<DummyEnv>::build(config, env_config.clone());
    let mut agent = DummyAgent::new(env_config.obs_dim, env_config.act_dim).num_minibatches(4);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 0, 2)?;

    let record = trainer.train(&mut agent, &mut recorder, &mut evaluator)?;

    // 100 / (8 * 2) = 6 updates
    assert_eq!(agent.batch_sizes, vec![16; 6]);
    let lrs: Vec<f64> = (0..6).map(|i| 1e-3 * (1.0 - i as f64 / 6.0)).collect();
    for (lr, expected) in agent.learning_rates.iter().zip(lrs.iter()) {
        assert!((lr - expected).abs() < 1e-12);
    }
    assert_eq!(
        recorder.scalars("global_step"),
        vec![16.0, 32.0, 48.0, 64.0, 80.0, 96.0, 96.0]
    );
    assert_eq!(recorder.scalars("charts/episodic_return"), vec![5.0; 6]);
    assert_eq!(record.get_scalar("eval/episodic_return")?, 5.0);
    assert!(model_dir.join("final").join("dummy.txt").exists());
    assert!(!agent.is_train());
    Ok(())
}

#[test]
fn test_indivisible_batch_fails_before_training() -> Result<()> {
    let config = TrainerConfig::default().total_timesteps(100).n_steps(5);
    let env_config = env_config();
    let mut trainer = Trainer::<DummyEnv>::build(config, env_config.clone());
    let mut agent = DummyAgent::new(env_config.obs_dim, env_config.act_dim).num_minibatches(3);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 0, 1)?;

    let err = trainer
        .train(&mut agent, &mut recorder, &mut evaluator)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<StrideError>(),
        Some(&StrideError::IndivisibleBatch {
            batch_size: 10,
            num_minibatches: 3
        })
    );
    assert!(agent.batch_sizes.is_empty());
    assert!(recorder.is_empty());
    Ok(())
}

#[test]
fn test_zero_updates_is_rejected() -> Result<()> {
    let config = TrainerConfig::default().total_timesteps(10).n_steps(8);
    let env_config = env_config();
    let mut trainer = Trainer::<DummyEnv>::build(config, env_config.clone());
    let mut agent = DummyAgent::new(env_config.obs_dim, env_config.act_dim);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 0, 1)?;

    let err = trainer
        .train(&mut agent, &mut recorder, &mut evaluator)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StrideError>(),
        Some(StrideError::InvalidConfig(_))
    ));
    Ok(())
}

#[test]
fn test_failure_to_save_parameters_is_an_error() -> Result<()> {
    let dir = TempDir::new("trainer_save")?;
    let file = dir.path().join("not_a_directory");
    std::fs::write(&file, "")?;
    let model_dir = file.join("model");

    let config = TrainerConfig::default()
        .total_timesteps(32)
        .n_steps(8)
        .model_dir(model_dir.to_str().unwrap());
    let env_config = env_config();
    let mut trainer = Trainer::<DummyEnv>::build(config, env_config.clone());
    let mut agent = DummyAgent::new(env_config.obs_dim, env_config.act_dim);
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = DefaultEvaluator::<DummyEnv>::new(&env_config, 0, 1)?;

    assert!(trainer
        .train(&mut agent, &mut recorder, &mut evaluator)
        .is_err());
    assert_eq!(agent.batch_sizes, vec![16; 2]);
    assert!(!model_dir.join("final").exists());
    Ok(())
}
