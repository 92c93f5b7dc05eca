//! Built-in seed word list
//!
//! Used to populate a community's dictionary on first install. Everything
//! here is already in canonical (title-cased) form and easy to draw.

/// Words seeded into an empty community dictionary
pub const DEFAULT_WORDS: &[&str] = &[
    "Airplane", "Anchor", "Apple", "Astronaut", "Avocado", "Backpack", "Balloon", "Banana",
    "Beach", "Bell", "Bicycle", "Bird", "Boat", "Bone", "Book", "Bottle", "Bridge", "Broom",
    "Bucket", "Butterfly", "Cactus", "Cake", "Camera", "Campfire", "Candle", "Car", "Castle",
    "Cat", "Chair", "Cheese", "Cherry", "Church", "Cloud", "Clown", "Compass", "Cookie",
    "Crab", "Crayon", "Crown", "Cupcake", "Diamond", "Dinosaur", "Dog", "Dolphin", "Donut",
    "Dragon", "Drum", "Duck", "Eagle", "Earth", "Elephant", "Envelope", "Feather", "Fence",
    "Fire", "Fish", "Flag", "Flashlight", "Flower", "Fork", "Fountain", "Fox", "Ghost",
    "Giraffe", "Glasses", "Glove", "Guitar", "Hammer", "Hamburger", "Hat", "Helicopter",
    "House", "Ice Cream", "Igloo", "Island", "Jellyfish", "Kangaroo", "Key", "Kite", "Ladder",
    "Lamp", "Leaf", "Lighthouse", "Lightning", "Lion", "Lobster", "Mailbox", "Map", "Mermaid",
    "Microphone", "Monkey", "Moon", "Mountain", "Mushroom", "Octopus", "Owl", "Palm Tree",
    "Pancake", "Panda", "Peacock", "Pencil", "Penguin", "Piano", "Pineapple", "Pirate",
    "Pizza", "Pumpkin", "Rainbow", "Robot", "Rocket", "Sailboat", "Sandwich", "Scissors",
    "Shark", "Skateboard", "Snail", "Snake", "Snowman", "Spider", "Strawberry", "Submarine",
    "Sun", "Sunflower", "Telescope", "Tent", "Tiger", "Toaster", "Tornado", "Tractor",
    "Train", "Treehouse", "Trophy", "Trumpet", "Turtle", "Umbrella", "Unicorn", "Volcano",
    "Waterfall", "Whale", "Windmill", "Wizard", "Zebra",
];
