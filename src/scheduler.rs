
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use rand::{SeedableRng, StdRng};

use film::Film;
use tracer::{PathTracer, Scratch};

/// One full-frame sample pass. Running a task traces every pixel once,
/// enqueues its replacement so sampling never starves, then commits the
/// pass through the film lock.
pub struct TraceTask;

impl TraceTask {
    fn run(&self,
           tracer: &PathTracer,
           film: &Film,
           queue: &TaskQueue,
           scratch: &mut Scratch,
           rng: &mut StdRng) {
        tracer.trace_pass(scratch, rng);
        queue.push(TraceTask);
        film.add_samples(&scratch.color);
    }
}

/// Multi-producer/multi-consumer FIFO. Workers block on the condition
/// variable while the queue is empty; `halt` wakes everyone so in-flight
/// tasks finish, commit once, and the workers drain out.
pub struct TaskQueue {
    tasks: Mutex<VecDeque<TraceTask>>,
    ready: Condvar,
    stop: AtomicBool,
}

impl TaskQueue {
    fn new() -> TaskQueue {
        TaskQueue {
            tasks: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            stop: AtomicBool::new(false),
        }
    }

    pub fn push(&self, task: TraceTask) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.push_back(task);
        self.ready.notify_one();
    }

    /// `None` once the scheduler is stopping.
    fn pop(&self) -> Option<TraceTask> {
        let mut tasks = self.tasks.lock().unwrap();
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(task) = tasks.pop_front() {
                return Some(task);
            }
            tasks = self.ready.wait(tasks).unwrap();
        }
    }

    fn halt(&self) {
        // take the lock so no worker can slip between its stop check and
        // the wait; everyone parked here is woken and sees the flag
        let _tasks = self.tasks.lock().unwrap();
        self.stop.store(true, Ordering::SeqCst);
        self.ready.notify_all();
    }
}

/// Fixed pool of tracing workers fed by one shared queue. Each worker
/// owns its scratch buffers and its own deterministically seeded RNG
/// stream; reproducibility is per worker, not global.
pub struct TileScheduler {
    queue: Arc<TaskQueue>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl TileScheduler {
    pub fn start(tracer: Arc<PathTracer>,
                 film: Arc<Film>,
                 worker_count: usize,
                 seed: usize)
                 -> TileScheduler {
        assert!(worker_count > 0);
        let queue = Arc::new(TaskQueue::new());
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            queue.push(TraceTask);
            let queue = queue.clone();
            let tracer = tracer.clone();
            let film = film.clone();
            let handle = thread::Builder::new()
                .name(format!("tracer-{}", index))
                .spawn(move || {
                    let mut rng: StdRng = SeedableRng::from_seed(&[seed, index][..]);
                    let mut scratch = tracer.scratch();
                    while let Some(task) = queue.pop() {
                        task.run(&tracer, &film, &queue, &mut scratch, &mut rng);
                    }
                })
                .unwrap();
            workers.push(handle);
        }
        TileScheduler {
            queue: queue,
            workers: workers,
        }
    }

    /// Cooperative shutdown: workers stop pulling, finish what they have,
    /// and are joined.
    pub fn stop(self) {
        self.queue.halt();
        for worker in self.workers {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use camera::Camera;
    use color::CIE1931;
    use film::Film;
    use material::{DiffuseMaterial, Material};
    use primitive::{Primitive, Triangle};
    use scene::Scene;
    use spectrum::Spectrum;
    use tracer::PathTracer;
    use vec::Vec3;
    use super::*;

    /// A fully emissive wall filling the view: every sample deposits the
    /// same XYZ value, so means are exact regardless of sample counts.
    fn lamp_tracer(width: u32, height: u32) -> Arc<PathTracer> {
        let lamp: Arc<Material + Send + Sync> =
            Arc::new(DiffuseMaterial::new(vec![0.0; 4], Some(vec![1.0; 4])));
        let primitives =
            vec![Primitive::Triangle(Triangle::new(Vec3::new(-4.0, -4.0, -1.0),
                                                   Vec3::new(4.0, -4.0, -1.0),
                                                   Vec3::new(4.0, 4.0, -1.0),
                                                   lamp.clone())),
                 Primitive::Triangle(Triangle::new(Vec3::new(-4.0, -4.0, -1.0),
                                                   Vec3::new(4.0, 4.0, -1.0),
                                                   Vec3::new(-4.0, 4.0, -1.0),
                                                   lamp.clone()))];
        let camera = Camera::new(Vec3::zero(),
                                 Vec3::new(0.0, 0.0, -1.0),
                                 Vec3::new(0.0, 1.0, 0.0),
                                 1.0,
                                 0.0,
                                 0.0,
                                 2.0,
                                 2.0);
        let scene = Arc::new(Scene::new(primitives, camera));
        Arc::new(PathTracer::new(scene,
                                 Arc::new(Spectrum::even(400.0, 700.0, 4)),
                                 Arc::new(CIE1931),
                                 width,
                                 height))
    }

    fn render_until(tracer: Arc<PathTracer>, workers: usize, samples: u32) -> (Vec<Vec3>, Vec<u32>) {
        let film = Arc::new(Film::new(tracer.width(), tracer.height()));
        let scheduler = TileScheduler::start(tracer, film.clone(), workers, 1337);
        while film.min_samples() < samples {
            thread::sleep(Duration::from_millis(1));
        }
        scheduler.stop();
        film.snapshot()
    }

    #[test]
    fn test_sampling_is_continuous_until_stopped() {
        let (_, samples) = render_until(lamp_tracer(4, 4), 2, 3);
        for count in samples {
            assert!(count >= 3);
        }
    }

    #[test]
    fn test_worker_count_does_not_change_the_means() {
        let (xyz_single, samples_single) = render_until(lamp_tracer(4, 4), 1, 2);
        let (xyz_pool, samples_pool) = render_until(lamp_tracer(4, 4), 4, 2);
        for i in 0..xyz_single.len() {
            let mean_single = xyz_single[i] / samples_single[i] as f32;
            let mean_pool = xyz_pool[i] / samples_pool[i] as f32;
            assert_relative_eq!(mean_single.x, mean_pool.x, epsilon = 1e-4);
            assert_relative_eq!(mean_single.y, mean_pool.y, epsilon = 1e-4);
            assert_relative_eq!(mean_single.z, mean_pool.z, epsilon = 1e-4);
        }
    }
}
