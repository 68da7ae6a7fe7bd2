//! Plain gradient descent over a transform module.

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{GradientsParams, Optimizer, Sgd, SgdConfig};
use burn::tensor::backend::AutodiffBackend;

/// Fixed-step gradient descent.
///
/// A thin wrapper over SGD without momentum, holding the learning rate so
/// callers only hand over the module and its gradients.
pub struct GradientDescent<M, B>
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
{
    optim: OptimizerAdaptor<Sgd<B::InnerBackend>, M, B>,
    learning_rate: f64,
}

impl<M, B> GradientDescent<M, B>
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
{
    pub fn new(learning_rate: f64) -> Self {
        Self {
            optim: SgdConfig::new().init(),
            learning_rate,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// One descent step, consuming and returning the module.
    pub fn step(&mut self, module: M, grads: GradientsParams) -> M {
        self.optim.step(self.learning_rate, module, grads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::Autodiff;
    use burn::tensor::ElementConversion;
    use burn_ndarray::NdArray;
    use petra_core::transform::RigidTransform;

    type B = Autodiff<NdArray<f32>>;

    #[test]
    fn test_step_reduces_quadratic_loss() {
        let device = Default::default();
        let mut transform = RigidTransform::<B>::init([4.0, 0.0, 0.0], [0.0; 3], &device);
        let mut optim = GradientDescent::new(0.1);

        let loss_of = |t: &RigidTransform<B>| -> f64 {
            let v = t.translation.val();
            (v.clone() * v)
                .sum()
                .into_scalar()
                .elem::<f64>()
        };
        let initial = loss_of(&transform);

        for _ in 0..20 {
            let v = transform.translation.val();
            let loss = (v.clone() * v).sum();
            let grads = GradientsParams::from_grads(loss.backward(), &transform);
            transform = optim.step(transform, grads);
        }

        let final_loss = loss_of(&transform);
        assert!(final_loss < initial * 1e-2, "loss {final_loss}");

        // angles received no gradient and stay put
        let angles = transform
            .angles
            .val()
            .to_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(angles, vec![0.0, 0.0, 0.0]);
    }
}
