use std::{
    thread,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use log::{info, warn};
use threadpool::ThreadPool;


/// A job runs on the pool and returns the delay until its next run.
pub type FnTask = dyn Fn() -> Duration + Send + Sync + 'static;


pub struct Task {
    name: &'static str,
    job: Arc<FnTask>,
    next_time: Instant,
    running: bool,
}

impl Task {
    pub fn new<F>(name: &'static str, job: F, delay: Duration) -> Self where
        F: Fn() -> Duration + Send + Sync + 'static {

        Task {
            name,
            job: Arc::new(job),
            next_time: Instant::now() + delay,
            running: false,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        !self.running && now >= self.next_time
    }

    fn finish_job(&mut self, next_delay: Duration) {
        self.next_time = Instant::now() + next_delay;
        self.running = false;
    }
}


pub struct TaskSchedulerBuilder {
    tasks: Vec<Arc<Mutex<Task>>>,
    n_workers: usize,
    period_resolution: Duration,
}

impl TaskSchedulerBuilder {
    pub fn new() -> Self {
        TaskSchedulerBuilder {
            tasks: Vec::new(),
            n_workers: 2,
            period_resolution: Duration::from_secs(1),
        }
    }

    pub fn n_workers(mut self, cnt: usize) -> Self {
        self.n_workers = cnt.max(1);
        self
    }

    pub fn period_resolution(mut self, period: Duration) -> Self {
        self.period_resolution = period;
        self
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(Arc::new(Mutex::new(task)));
    }

    pub fn build(self) -> TaskScheduler {
        TaskScheduler::start(self)
    }
}


pub struct TaskScheduler {
    scheduler: Option<thread::JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl TaskScheduler {
    fn start(builder: TaskSchedulerBuilder) -> Self {
        let TaskSchedulerBuilder { tasks, n_workers, period_resolution } = builder;

        let running = Arc::new(AtomicBool::new(true));
        let t_running = running.clone();

        let scheduler_job = move || {
            let pool = ThreadPool::new(n_workers);

            while t_running.load(Ordering::SeqCst) {
                let now = Instant::now();

                for m_task in &tasks {
                    let mut task = match m_task.lock() {
                        Ok(task) => task,
                        Err(_) => continue,
                    };

                    if task.ready(now) {
                        task.running = true;

                        let job = task.job.clone();
                        let name = task.name;
                        let t_task = m_task.clone();
                        pool.execute(move || {
                            let next_delay = job();
                            match t_task.lock() {
                                Ok(mut task) => task.finish_job(next_delay),
                                Err(_) => warn!("Task {} is poisoned", name),
                            }
                        });
                    }
                }

                thread::sleep(period_resolution);
            }

            pool.join();
        };

        info!("Task scheduler started");

        TaskScheduler {
            scheduler: Some(thread::spawn(scheduler_job)),
            running,
        }
    }

    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(handle) = self.scheduler.take() {
            if handle.join().is_err() {
                warn!("Task scheduler thread panicked");
            }
        }

        info!("Task scheduler stopped");
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
