use rand::Rng;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::layers::grads::ParamGrads;
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor;

/// 2D convolution with a square kernel, stride 1, symmetric zero padding and
/// a fused element-wise activation.
///
/// Weights are laid out `[out_channels][in_channels][kernel][kernel]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub padding: usize,
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
    pub activator: ActivationFunction,
}

#[derive(Debug, Clone)]
pub struct Conv2dCache {
    input: Tensor,
    pre_activation: Tensor,
}

/// Output positions `o` along one axis whose input tap `o + offset - padding`
/// falls inside `[0, in_len)`.
fn valid_range(offset: usize, padding: usize, out_len: usize, in_len: usize) -> (usize, usize) {
    let lo = padding.saturating_sub(offset);
    let hi = (in_len + padding).saturating_sub(offset).min(out_len);
    (lo, hi.max(lo))
}

impl Conv2d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        padding: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        let fan_in = in_channels * kernel_size * kernel_size;
        let std_dev = (2.0 / fan_in.max(1) as f64).sqrt();
        Conv2d {
            in_channels,
            out_channels,
            kernel_size,
            padding,
            weights: Matrix::normal_vec(out_channels * fan_in, std_dev, rng),
            biases: vec![0.0; out_channels],
            activator: activation,
        }
    }

    /// Spatial output extent, or `None` when the kernel does not fit.
    pub fn output_dims(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        let h = height + 2 * self.padding;
        let w = width + 2 * self.padding;
        if h < self.kernel_size || w < self.kernel_size {
            return None;
        }
        Some((h - self.kernel_size + 1, w - self.kernel_size + 1))
    }

    fn kernel_len(&self) -> usize {
        self.in_channels * self.kernel_size * self.kernel_size
    }

    fn linear(&self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.channels, self.in_channels,
            "conv2d expects {} input channels, got {}",
            self.in_channels, input.channels
        );
        let (oh, ow) = self
            .output_dims(input.height, input.width)
            .expect("conv2d input is smaller than the kernel");
        let (ih, iw) = (input.height, input.width);
        let k = self.kernel_size;
        let p = self.padding;
        let kernel_len = self.kernel_len();

        let mut out = vec![0.0; self.out_channels * oh * ow];
        out.par_chunks_mut(oh * ow).enumerate().for_each(|(oc, out_plane)| {
            out_plane.fill(self.biases[oc]);
            let kernel = &self.weights[oc * kernel_len..(oc + 1) * kernel_len];
            for ic in 0..self.in_channels {
                let in_plane = input.plane(ic);
                for ky in 0..k {
                    let (y0, y1) = valid_range(ky, p, oh, ih);
                    for kx in 0..k {
                        let w = kernel[(ic * k + ky) * k + kx];
                        if w == 0.0 {
                            continue;
                        }
                        let (x0, x1) = valid_range(kx, p, ow, iw);
                        for y in y0..y1 {
                            let iy = y + ky - p;
                            let in_row = &in_plane[iy * iw..(iy + 1) * iw];
                            let out_row = &mut out_plane[y * ow..(y + 1) * ow];
                            for x in x0..x1 {
                                out_row[x] += w * in_row[x + kx - p];
                            }
                        }
                    }
                }
            }
        });
        Tensor::from_data(self.out_channels, oh, ow, out)
    }

    pub fn forward(&self, input: &Tensor) -> Tensor {
        self.linear(input).map(|z| self.activator.function(z))
    }

    pub fn forward_cached(&self, input: &Tensor) -> (Tensor, Conv2dCache) {
        let z = self.linear(input);
        let a = z.map(|v| self.activator.function(v));
        (a, Conv2dCache { input: input.clone(), pre_activation: z })
    }

    pub fn backward(
        &self,
        cache: &Conv2dCache,
        grad_output: &Tensor,
        grads: Option<&mut ParamGrads>,
        need_input_grad: bool,
    ) -> Option<Tensor> {
        let input = &cache.input;
        let (ih, iw) = (input.height, input.width);
        let (oh, ow) = (grad_output.height, grad_output.width);
        let k = self.kernel_size;
        let p = self.padding;
        let kernel_len = self.kernel_len();

        // δ = error ⊙ σ'(z)
        let delta: Vec<f64> = grad_output.data.iter()
            .zip(cache.pre_activation.data.iter())
            .map(|(g, &z)| g * self.activator.derivative(z))
            .collect();

        if let Some(grads) = grads {
            grads.weights
                .par_chunks_mut(kernel_len)
                .zip(grads.biases.par_iter_mut())
                .enumerate()
                .for_each(|(oc, (w_grad, b_grad))| {
                    let d_plane = &delta[oc * oh * ow..(oc + 1) * oh * ow];
                    *b_grad += d_plane.iter().sum::<f64>();
                    for ic in 0..self.in_channels {
                        let in_plane = input.plane(ic);
                        for ky in 0..k {
                            let (y0, y1) = valid_range(ky, p, oh, ih);
                            for kx in 0..k {
                                let (x0, x1) = valid_range(kx, p, ow, iw);
                                let mut sum = 0.0;
                                for y in y0..y1 {
                                    let iy = y + ky - p;
                                    let d_row = &d_plane[y * ow..(y + 1) * ow];
                                    let in_row = &in_plane[iy * iw..(iy + 1) * iw];
                                    for x in x0..x1 {
                                        sum += d_row[x] * in_row[x + kx - p];
                                    }
                                }
                                w_grad[(ic * k + ky) * k + kx] += sum;
                            }
                        }
                    }
                });
        }

        if !need_input_grad {
            return None;
        }

        let mut input_grad = vec![0.0; self.in_channels * ih * iw];
        input_grad.par_chunks_mut(ih * iw).enumerate().for_each(|(ic, g_plane)| {
            for oc in 0..self.out_channels {
                let d_plane = &delta[oc * oh * ow..(oc + 1) * oh * ow];
                let kernel = &self.weights[oc * kernel_len..(oc + 1) * kernel_len];
                for ky in 0..k {
                    let (y0, y1) = valid_range(ky, p, oh, ih);
                    for kx in 0..k {
                        let w = kernel[(ic * k + ky) * k + kx];
                        let (x0, x1) = valid_range(kx, p, ow, iw);
                        for y in y0..y1 {
                            let iy = y + ky - p;
                            let d_row = &d_plane[y * ow..(y + 1) * ow];
                            let g_row = &mut g_plane[iy * iw..(iy + 1) * iw];
                            for x in x0..x1 {
                                g_row[x + kx - p] += w * d_row[x];
                            }
                        }
                    }
                }
            }
        });
        Some(Tensor::from_data(self.in_channels, ih, iw, input_grad))
    }

    pub fn param_lens(&self) -> (usize, usize) {
        (self.weights.len(), self.biases.len())
    }

    pub fn params_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.weights, &mut self.biases)
    }
}
