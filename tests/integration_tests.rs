//! Integration tests for the rotsom training engine.

use approx::assert_relative_eq;
use rotsom::som::gaussian;
use rotsom::storage::write_som;
use rotsom::{
    ImageStream, Initialization, NeighborhoodKind, RotsomError, Trainer, TrainingConfig,
};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

/// Writes a binary image stream in the input container format.
fn write_stream(path: &Path, images: &[Vec<f32>], width: usize, height: usize) {
    let mut file = File::create(path).unwrap();
    file.write_all(b"# synthetic test stream\n# END OF HEADER\n")
        .unwrap();
    for value in [0i32, 0, 0, images.len() as i32, 0, 2, width as i32, height as i32] {
        file.write_all(&value.to_le_bytes()).unwrap();
    }
    for image in images {
        assert_eq!(image.len(), width * height);
        for pixel in image {
            file.write_all(&pixel.to_le_bytes()).unwrap();
        }
    }
}

fn base_config() -> TrainingConfig {
    TrainingConfig {
        neuron_dim: 2,
        som_width: 1,
        som_height: 1,
        init: Initialization::Zero,
        rotations: 1,
        flip: false,
        neighborhood: NeighborhoodKind::Gaussian,
        sigma: 1.0,
        learning_rate: 1.0,
        ..Default::default()
    }
}

#[test]
fn test_single_neuron_absorbs_scaled_input() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    write_stream(&input, &[vec![1.0, 2.0, 3.0, 4.0]], 2, 2);

    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(base_config(), 2, 2, 1).unwrap();
    let report = trainer.train(stream).unwrap();
    assert_eq!(report.inputs_consumed, 1);

    // One step against a zero map scales the input by the kernel peak.
    let w = gaussian(0.0, 1.0);
    assert_relative_eq!(w, 0.39894, epsilon = 1e-5);
    for (p, source) in trainer.som().neuron(0).iter().zip([1.0, 2.0, 3.0, 4.0]) {
        assert_relative_eq!(*p, source * w, epsilon = 1e-5);
    }
}

#[test]
fn test_neighborhood_falloff_across_map() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    write_stream(&input, &[vec![1.0, 0.0, 0.0, 0.0]], 2, 2);

    let config = TrainingConfig {
        som_width: 2,
        som_height: 2,
        ..base_config()
    };
    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(config, 2, 2, 1).unwrap();
    trainer.train(stream).unwrap();

    // Every neuron of a zero map ties, so the best match is the neuron
    // with the smallest linear index, at layout coordinate (0, 0).
    let som = trainer.som();
    let w0 = gaussian(0.0, 1.0);
    let w1 = gaussian(1.0, 1.0);
    let w2 = gaussian(2.0f32.sqrt(), 1.0);
    assert_relative_eq!(w1, 0.24197, epsilon = 1e-5);

    assert_relative_eq!(som.neuron(0)[0], w0, epsilon = 1e-5);
    assert_relative_eq!(som.neuron(1)[0], w1, epsilon = 1e-5);
    assert_relative_eq!(som.neuron(2)[0], w1, epsilon = 1e-5);
    assert_relative_eq!(som.neuron(3)[0], w2, epsilon = 1e-5);
    // The other pixels of the input are zero, so they stay zero.
    assert_eq!(som.neuron(0)[1], 0.0);
    assert_eq!(som.neuron(3)[3], 0.0);
}

#[test]
fn test_training_is_deterministic() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");

    let images: Vec<Vec<f32>> = (0..100)
        .map(|i| (0..36).map(|p| ((i * 31 + p * 7) % 17) as f32 / 16.0).collect())
        .collect();
    write_stream(&input, &images, 6, 6);

    let config = TrainingConfig {
        neuron_dim: 4,
        som_width: 4,
        som_height: 4,
        init: Initialization::Random,
        seed: Some(42),
        rotations: 8,
        flip: true,
        sigma: 1.0,
        learning_rate: 0.2,
        ..Default::default()
    };

    let run = || {
        let stream = ImageStream::open(&input).unwrap();
        let mut trainer = Trainer::new(config.clone(), 6, 6, 100).unwrap();
        trainer.train(stream).unwrap();
        trainer.into_som()
    };

    let a = run();
    let b = run();
    assert_eq!(a.weights(), b.weights());
}

#[test]
fn test_trained_map_round_trips_through_writer() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    let output = dir.path().join("map.bin");
    write_stream(&input, &vec![vec![0.5; 16]; 3], 4, 4);

    let config = TrainingConfig {
        neuron_dim: 2,
        som_width: 3,
        som_height: 2,
        rotations: 4,
        flip: true,
        ..base_config()
    };
    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(config, 4, 4, 3).unwrap();
    trainer.train(stream).unwrap();
    write_som(trainer.som(), &output).unwrap();

    let mut reopened = ImageStream::open(&output).unwrap();
    assert_eq!(reopened.number_of_entries(), 1);
    assert_eq!(reopened.width(), 6);
    assert_eq!(reopened.height(), 4);
    let composite = reopened.next().unwrap().unwrap();
    assert_eq!(
        composite.as_slice(),
        trainer.som().to_composite_image().as_slice()
    );
}

#[test]
fn test_truncated_stream_surfaces_format_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    write_stream(&input, &[vec![1.0; 4], vec![2.0; 4]], 2, 2);

    // Chop the last entry short.
    let bytes = std::fs::read(&input).unwrap();
    std::fs::write(&input, &bytes[..bytes.len() - 8]).unwrap();

    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(base_config(), 2, 2, 2).unwrap();
    let result = trainer.train(stream);
    assert!(matches!(result, Err(RotsomError::InputFormat(_))));
    // The first entry completed, and the map holds its state.
    assert_eq!(trainer.steps_done(), 1);
    assert!(trainer.som().is_finite());
}

#[test]
fn test_max_inputs_caps_consumption() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");
    write_stream(&input, &vec![vec![1.0; 4]; 10], 2, 2);

    let config = TrainingConfig {
        max_inputs: Some(3),
        ..base_config()
    };
    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(config, 2, 2, 3).unwrap();
    let report = trainer.train(stream).unwrap();
    assert_eq!(report.inputs_consumed, 3);
}

/// Plain k-means with k = 2, seeded from the two most distant points.
fn two_means(points: &[Vec<f32>]) -> Vec<usize> {
    let dist = |a: &[f32], b: &[f32]| -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    };

    let mut seed = (0, 1);
    let mut best = 0.0;
    for i in 0..points.len() {
        for j in i + 1..points.len() {
            let d = dist(&points[i], &points[j]);
            if d > best {
                best = d;
                seed = (i, j);
            }
        }
    }

    let mut centroids = [points[seed.0].clone(), points[seed.1].clone()];
    let mut assignment = vec![0; points.len()];
    for _ in 0..20 {
        for (i, point) in points.iter().enumerate() {
            assignment[i] = if dist(point, &centroids[0]) <= dist(point, &centroids[1]) {
                0
            } else {
                1
            };
        }
        for cluster in 0..2 {
            let members: Vec<&Vec<f32>> = points
                .iter()
                .zip(&assignment)
                .filter(|(_, &a)| a == cluster)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let mut mean = vec![0.0; points[0].len()];
            for member in &members {
                for (m, v) in mean.iter_mut().zip(member.iter()) {
                    *m += v;
                }
            }
            for m in &mut mean {
                *m /= members.len() as f32;
            }
            centroids[cluster] = mean;
        }
    }
    assignment
}

#[test]
fn test_two_cluster_corpus_partitions_the_map() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input.bin");

    // Two radially symmetric populations: bright centers and dim
    // centers, with deterministic per-pixel jitter standing in for the
    // cluster spread.
    let width = 8;
    let images: Vec<Vec<f32>> = (0..1000)
        .map(|i| {
            let level: f32 = if i % 2 == 0 { 2.0 } else { 0.0 };
            (0..width * width)
                .map(|p| {
                    let jitter = (((i * 131 + p * 37) % 11) as f32 / 10.0 - 0.5) * 0.1;
                    level + jitter
                })
                .collect()
        })
        .collect();
    write_stream(&input, &images, width, width);

    let config = TrainingConfig {
        neuron_dim: 4,
        som_width: 3,
        som_height: 3,
        init: Initialization::Zero,
        rotations: 8,
        flip: false,
        neighborhood: NeighborhoodKind::Gaussian,
        sigma: 0.25,
        learning_rate: 0.5,
        ..Default::default()
    };
    let stream = ImageStream::open(&input).unwrap();
    let mut trainer = Trainer::new(config, width, width, 1000).unwrap();
    trainer.train(stream).unwrap();

    let som = trainer.som();
    let neurons: Vec<Vec<f32>> = (0..som.total_neurons())
        .map(|i| som.neuron(i).to_vec())
        .collect();
    let assignment = two_means(&neurons);

    // Ground truth per neuron: which population prototype it ended up
    // closer to.
    let bright = vec![2.0f32; 16];
    let dim = vec![0.0f32; 16];
    let truth: Vec<usize> = neurons
        .iter()
        .map(|n| {
            let to_bright: f32 = n.iter().zip(&bright).map(|(a, b)| (a - b) * (a - b)).sum();
            let to_dim: f32 = n.iter().zip(&dim).map(|(a, b)| (a - b) * (a - b)).sum();
            usize::from(to_dim < to_bright)
        })
        .collect();

    let mut agree = 0;
    let mut disagree = 0;
    for (a, t) in assignment.iter().zip(&truth) {
        if a == t {
            agree += 1;
        } else {
            disagree += 1;
        }
    }
    // Cluster numbering is arbitrary, so take the better orientation.
    let purity = agree.max(disagree) as f32 / neurons.len() as f32;
    assert!(
        purity >= 0.9,
        "expected the map to split into the two populations, purity {}",
        purity
    );

    // Both populations must actually be represented.
    assert!(truth.iter().any(|&t| t == 0));
    assert!(truth.iter().any(|&t| t == 1));
}
