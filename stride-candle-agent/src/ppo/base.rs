use super::PpoConfig;
use crate::{
    actor_critic::ActorCritic,
    dist::ActionDist,
    opt::Optimizer,
    util::{array2_to_tensor, clip_grad_norm, slice_to_tensor, tensor_to_array2},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarMap;
use log::{debug, info, trace};
use ndarray::Array2;
use rand::{rngs::StdRng, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
};
use stride_core::{
    record::{Record, RecordValue},
    util::{mean, std_unbiased},
    ActOutput, Agent, MinibatchSampler, Policy, RolloutBatch,
};

const MODEL_FILE: &str = "model.safetensors";

/// Losses and diagnostics on a minibatch.
pub struct PpoLosses {
    /// Total loss, tracking gradients.
    pub loss: Tensor,

    /// Clipped surrogate policy loss.
    pub policy_loss: f32,

    /// Value loss.
    pub value_loss: f32,

    /// Mean entropy of the policy.
    pub entropy: f32,

    /// `mean(-log_ratio)`.
    pub old_approx_kl: f32,

    /// `mean((ratio - 1) - log_ratio)`.
    pub approx_kl: f32,

    /// Fraction of samples with `|ratio - 1| > clip_coef`.
    pub clipfrac: f32,
}

/// Proximal policy optimization (PPO) agent.
pub struct Ppo<M: ActorCritic> {
    model: M,
    varmap: VarMap,
    opt: Optimizer,
    num_minibatches: usize,
    update_epochs: usize,
    norm_adv: bool,
    clip_coef: f64,
    clip_vloss: bool,
    ent_coef: f64,
    vf_coef: f64,
    max_grad_norm: f64,
    target_kl: Option<f64>,
    deterministic_eval: bool,
    train: bool,
    rng: StdRng,
    device: Device,
}

impl<M: ActorCritic> Ppo<M> {
    /// Constructs [`Ppo`] agent.
    pub fn build(config: PpoConfig<M::Config>) -> Result<Self> {
        let device: Device = config.device.try_into()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let varmap = VarMap::new();
        let model = M::build(&varmap, config.model_config, &device, &mut rng)?;
        let opt = config.opt_config.build(varmap.all_vars())?;
        debug!("Build PPO agent with {} variables", varmap.all_vars().len());

        Ok(Self {
            model,
            varmap,
            opt,
            num_minibatches: config.num_minibatches,
            update_epochs: config.update_epochs,
            norm_adv: config.norm_adv,
            clip_coef: config.clip_coef,
            clip_vloss: config.clip_vloss,
            ent_coef: config.ent_coef,
            vf_coef: config.vf_coef,
            max_grad_norm: config.max_grad_norm,
            target_kl: config.target_kl,
            deterministic_eval: config.deterministic_eval,
            train: true,
            rng,
            device,
        })
    }

    /// Returns the policy-value network.
    pub fn model(&self) -> &M {
        &self.model
    }

    fn advantages(&self, advantages: &[f32]) -> Result<Tensor> {
        let n = advantages.len();
        let adv = if self.norm_adv {
            let m = mean(advantages);
            let s = std_unbiased(advantages);
            advantages.iter().map(|a| (a - m) / (s + 1e-8)).collect()
        } else {
            advantages.to_vec()
        };
        Ok(Tensor::from_vec(adv, n, &self.device)?)
    }

    /// Computes the PPO loss on a minibatch.
    pub fn compute_losses(&self, mb: &RolloutBatch) -> Result<PpoLosses> {
        let n = mb.len();
        let obs = slice_to_tensor(&mb.obs, mb.obs_dim, &self.device)?;
        let act = slice_to_tensor(&mb.act, mb.act_dim, &self.device)?;
        let old_log_prob = Tensor::from_slice(&mb.log_prob, n, &self.device)?;
        let returns = Tensor::from_slice(&mb.returns, n, &self.device)?;

        let dist = self.model.dist(&obs)?;
        let log_prob = dist.log_prob(&act)?;
        let entropy = dist.entropy()?.mean_all()?;
        let value = self.model.value(&obs)?;

        let log_ratio = (log_prob - old_log_prob)?;
        let ratio = log_ratio.exp()?;

        let (old_approx_kl, approx_kl, clipfrac) = {
            let log_ratio = log_ratio.detach();
            let ratio = ratio.detach();
            let old_approx_kl = log_ratio.neg()?.mean_all()?.to_scalar::<f32>()?;
            let approx_kl = ((&ratio - 1.0)? - &log_ratio)?
                .mean_all()?
                .to_scalar::<f32>()?;
            let clipfrac = (&ratio - 1.0)?
                .abs()?
                .gt(self.clip_coef)?
                .to_dtype(DType::F32)?
                .mean_all()?
                .to_scalar::<f32>()?;
            (old_approx_kl, approx_kl, clipfrac)
        };

        let policy_loss = {
            let neg_adv = self.advantages(&mb.advantages)?.neg()?;
            let pg_loss1 = (&neg_adv * &ratio)?;
            let pg_loss2 = (&neg_adv * ratio.clamp(1.0 - self.clip_coef, 1.0 + self.clip_coef)?)?;
            pg_loss1.maximum(&pg_loss2)?.mean_all()?
        };

        let value_loss = if self.clip_vloss {
            let old_value = Tensor::from_slice(&mb.values, n, &self.device)?;
            let unclipped = (&value - &returns)?.sqr()?;
            let clipped = {
                let delta = (&value - &old_value)?.clamp(-self.clip_coef, self.clip_coef)?;
                ((old_value + delta)? - &returns)?.sqr()?
            };
            (unclipped.maximum(&clipped)?.mean_all()? * 0.5)?
        } else {
            ((&value - &returns)?.sqr()?.mean_all()? * 0.5)?
        };

        let loss = ((&policy_loss - (&entropy * self.ent_coef)?)? + (&value_loss * self.vf_coef)?)?;

        Ok(PpoLosses {
            loss,
            policy_loss: policy_loss.to_scalar::<f32>()?,
            value_loss: value_loss.to_scalar::<f32>()?,
            entropy: entropy.to_scalar::<f32>()?,
            old_approx_kl,
            approx_kl,
            clipfrac,
        })
    }

    fn opt_(&mut self, batch: &RolloutBatch) -> Result<Record> {
        let sampler = MinibatchSampler::new(batch.len(), self.num_minibatches)?;
        let vars = self.varmap.all_vars();
        let mut clipfracs = vec![];
        let mut last: Option<(PpoLosses, f32)> = None;
        let mut n_epochs = 0;

        for epoch in 0..self.update_epochs {
            for ixs in sampler.shuffle(&mut self.rng) {
                let mb = batch.gather(&ixs);
                let losses = self.compute_losses(&mb)?;
                let mut grads = losses.loss.backward()?;
                let grad_norm = clip_grad_norm(&mut grads, &vars, self.max_grad_norm)?;
                self.opt.step(&grads)?;
                clipfracs.push(losses.clipfrac);
                last = Some((losses, grad_norm));
            }
            n_epochs += 1;

            if let (Some(target_kl), Some((losses, _))) = (self.target_kl, last.as_ref()) {
                if losses.approx_kl as f64 > target_kl {
                    info!(
                        "Early stop at epoch {}: approx_kl {} > {}",
                        epoch, losses.approx_kl, target_kl
                    );
                    break;
                }
            }
        }

        let mut record = Record::from_slice(&[
            ("losses/clipfrac", RecordValue::Scalar(mean(&clipfracs))),
            ("charts/update_epochs", RecordValue::Scalar(n_epochs as f32)),
        ]);
        if let Some((losses, grad_norm)) = last {
            trace!(
                "policy_loss: {}, value_loss: {}, approx_kl: {}",
                losses.policy_loss,
                losses.value_loss,
                losses.approx_kl
            );
            record.merge_inplace(Record::from_slice(&[
                ("losses/value_loss", RecordValue::Scalar(losses.value_loss)),
                ("losses/policy_loss", RecordValue::Scalar(losses.policy_loss)),
                ("losses/entropy", RecordValue::Scalar(losses.entropy)),
                ("losses/old_approx_kl", RecordValue::Scalar(losses.old_approx_kl)),
                ("losses/approx_kl", RecordValue::Scalar(losses.approx_kl)),
                ("losses/grad_norm", RecordValue::Scalar(grad_norm)),
            ]));
        }

        Ok(record)
    }
}

impl<M: ActorCritic> Policy for Ppo<M> {
    fn sample(&mut self, obs: &Array2<f32>) -> Result<Array2<f32>> {
        let obs = array2_to_tensor(obs, &self.device)?;
        let dist = self.model.dist(&obs)?;
        let act = if self.train || !self.deterministic_eval {
            dist.sample(&mut self.rng)?
        } else {
            dist.mean()?.detach()
        };
        tensor_to_array2(&act)
    }
}

impl<M: ActorCritic> Agent for Ppo<M> {
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn act(&mut self, obs: &Array2<f32>) -> Result<ActOutput> {
        let obs = array2_to_tensor(obs, &self.device)?;
        let (act, log_prob, _, value) = self.model.act(&obs, None, &mut self.rng)?;
        Ok(ActOutput {
            act: tensor_to_array2(&act.detach())?,
            log_prob: log_prob.detach().to_vec1()?,
            value: value.detach().to_vec1()?,
        })
    }

    fn value(&mut self, obs: &Array2<f32>) -> Result<Vec<f32>> {
        let obs = array2_to_tensor(obs, &self.device)?;
        Ok(self.model.value(&obs)?.detach().to_vec1()?)
    }

    fn check_batch_size(&self, batch_size: usize) -> Result<()> {
        MinibatchSampler::new(batch_size, self.num_minibatches)?;
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.opt.learning_rate()
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.opt.set_learning_rate(lr);
    }

    fn opt_with_record(&mut self, batch: &RolloutBatch) -> Result<Record> {
        self.opt_(batch)
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let file = path.join(MODEL_FILE);
        self.varmap.save(&file)?;
        info!("Save PPO model to {:?}", file);
        Ok(vec![file])
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = path.join(MODEL_FILE);
        self.varmap.load(&file)?;
        info!("Load PPO model from {:?}", file);
        Ok(())
    }
}
