use pose_control::*;
use pose_kinematics::integrate;

fn main() {
    let (k1, k2, k3) = (0.4, 0.8, 0.8);
    let goal = GoalPose::new(1.0, 1.0, 0.0);
    let mut current_pose = Pose2D::new(-1.0, 0.0, 0.0);
    let dt = 0.05;
    let num_steps = 400;

    let mut controller = match PoseController::from_gains(k1, k2, k3) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to initialize controller: {}", e);
            return;
        }
    };
    controller.load_goal(goal);

    println!("Initializing simulation...");
    println!("  Gains:        k1={} k2={} k3={}", k1, k2, k3);
    println!("  Limits:       v_max={} om_max={}", controller.limits().v_max(), controller.limits().om_max());
    println!("  Goal:         {}", goal);
    println!("  Initial Pose: {}", current_pose);
    println!("\nSimulating...");

    let tolerance = GoalTolerance::default();
    for i in 0..num_steps {
        let mut sample = DiagnosticSample::default();
        let out = match controller.compute_control_with(current_pose, &mut |s: DiagnosticSample| sample = s) {
            Ok(out) => out,
            Err(e) => {
                eprintln!("Control failed at step {}: {}", i + 1, e);
                break;
            }
        };

        if i % 20 == 0 {
            println!(
                "Step {:>3}: Pose: {}  rho={:.3} alpha={:.3} delta={:.3}  cmd: {}",
                i + 1,
                current_pose,
                sample.rho,
                sample.alpha,
                sample.delta,
                Twist::from(out)
            );
        }
        if sample.within(&tolerance) {
            println!("Goal reached at step {}", i + 1);
            break;
        }

        match integrate(current_pose, out.into(), dt) {
            Ok(new_pose) => current_pose = new_pose,
            Err(e) => {
                eprintln!("Error during simulation step {}: {:?}", i + 1, e);
                break;
            }
        }
    }

    println!("\nSimulation complete.");
    println!("Final Pose: {}", current_pose);
}
