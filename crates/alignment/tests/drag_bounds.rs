use std::sync::Arc;

use lapse_alignment::{AlignmentController, DragBounds};
use lapse_project_model::{
    ContainerSize, Frame, FrameStore, ImageSource, MemoryStore, PixelOffset, ProjectStore,
};
use proptest::prelude::*;

fn drag_step() -> impl Strategy<Value = (f64, f64)> {
    (-5000.0f64..5000.0, -5000.0f64..5000.0)
}

proptest! {
    #[test]
    fn drags_never_leave_bounds(
        width in 1.0f64..2000.0,
        height in 1.0f64..2000.0,
        steps in prop::collection::vec(drag_step(), 1..40),
    ) {
        let store = Arc::new(MemoryStore::new());
        let project = store.create_project("Bounds").unwrap();
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::inline(vec![0])))
            .unwrap();

        let container = ContainerSize::new(width, height);
        let mut controller =
            AlignmentController::open(store.clone(), project.id.clone(), frame_id.clone()).unwrap();
        controller.measure(container);
        let bounds = DragBounds::for_container(container);

        for (i, (x, y)) in steps.into_iter().enumerate() {
            if i % 7 == 0 {
                controller.end_drag();
                controller.begin_drag().unwrap();
            }
            if !controller.is_dragging() {
                controller.begin_drag().unwrap();
            }
            controller.drag_to(PixelOffset::new(x, y)).unwrap();
            prop_assert!(bounds.contains(controller.offset()));

            let stored = store.get_frame(&project.id, &frame_id).unwrap().transform;
            prop_assert!(stored.position_x.abs() <= 0.5 + 1e-9);
            prop_assert!(stored.position_y.abs() <= 0.5 + 1e-9);
        }
    }
}
